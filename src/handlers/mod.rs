// One module per resource. Reads are public; every mutating route is
// wrapped in the JWT middleware when the router is built (see app.rs).
pub mod comments;
pub mod health;
pub mod posts;
pub mod validate;
