//! Constructor arguments used when no override is configured.

/// Base URL the token metadata is served from; token ids are appended.
pub const METADATA_URL: &str = "https://nft-collection-sneh1999.vercel.app/api/";

/// Whitelist contract consulted by `presaleMint`.
pub const WHITELIST_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
