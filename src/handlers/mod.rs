// handlers/mod.rs - HTTP handlers grouped by resource
//
// public:   service metadata (/ and /health)
// contacts: /contacts and /contact/:id
// children: /contact/:id/{address,phone,email}[/:child_id]
pub mod children;
pub mod contacts;
pub mod public;
pub mod utils;
