//! Domain constants

/// Reference tables that must be fetched before any record can be created.
pub const BOOTSTRAP_CODE_TABLES: &[&str] = &[
    "stations",
    "watercraft-types",
    "waterbodies",
    "provinces",
    "countries",
    "adult-mussel-locations",
    "decontamination-order-reasons",
];

/// Date format used for shift dates on the wire.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";
