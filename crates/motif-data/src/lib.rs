// motif-data: serde structs for motif shape and modification JSON
pub mod model;
