//! Diesel table definitions for the statically typed reads.
//!
//! Reference tables are read generically as JSON rows and are not declared
//! here.

diesel::table! {
    /// Uploaded extractions and the scope they were classified into.
    extractions (id) {
        id -> Uuid,
        cluster -> Nullable<Text>,
        customer -> Nullable<Text>,
        material_type -> Nullable<Text>,
    }
}
