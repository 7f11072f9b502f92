// Transdoc Document Store Infrastructure

mod local;

pub use local::LocalDocumentStore;
