//! Identity provider clients.

pub mod in_memory;
pub mod supabase;

pub use in_memory::InMemoryIdentityProvider;
pub use supabase::SupabaseIdentityProvider;
