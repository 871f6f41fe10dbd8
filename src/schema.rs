/// Column-name constants for the btb-tracekit tables.
/// Single source of truth for every join in the crate.

// ── Sample (metadata/centroid) columns ──────────────────────────────────────
pub mod sample {
    pub const SAMPLE_ID: &str = "sample_id";
    pub const ANIMAL_ID: &str = "Animal_ID";
    pub const HERD_NO: &str = "HERD_NO";
    pub const SPECIES: &str = "Species";
    pub const COUNTY: &str = "County";
    pub const X_COORD: &str = "X_COORD";
    pub const Y_COORD: &str = "Y_COORD";
}

// ── Clade level columns ─────────────────────────────────────────────────────
pub mod clade {
    /// SNP-distance clustering resolutions, tightest threshold first.
    pub const LEVELS: [&str; 5] = ["snp3", "snp12", "snp50", "snp200", "snp500"];

    /// Label given to samples that fall in no cluster at a level.
    pub const UNCLUSTERED: &str = "-1";
}

// ── Movement columns ────────────────────────────────────────────────────────
pub mod movement {
    pub const TAG: &str = "tag";
    pub const MOVE_FROM: &str = "move_from";
    pub const MOVE_TO: &str = "move_to";
    pub const MOVE_DATE: &str = "move_date";
}

// ── Land parcel columns ─────────────────────────────────────────────────────
pub mod parcel {
    pub const HERD_NO: &str = "SPH_HERD_N";
    pub const X_COORD: &str = "X_COORD";
    pub const Y_COORD: &str = "Y_COORD";
}

// ── Contact trace index columns ─────────────────────────────────────────────
pub mod contact {
    pub const ORIGIN_HERD: &str = "origin_herd";
    pub const TRACED_HERD: &str = "traced_herd";
    pub const TRACE_DIRECTION: &str = "direction";
}

// ── Direction values ────────────────────────────────────────────────────────
pub mod direction {
    pub const IDENTITY: &str = "identity";
    pub const FORWARD: &str = "forward";
    pub const BACKWARD: &str = "backward";
}
