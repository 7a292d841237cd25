/// Raw authorization key size in bytes
pub const AUTH_KEY_SIZE: usize = 256;

/// SHA-1 digest size in bytes
pub const SHA1_SIZE: usize = 20;

/// Offset added to broadcast-channel ids before negation in the marked
/// peer-id space
pub const CHANNEL_ID_BASE: i64 = 1_000_000_000_000;

/// Version byte carried by the compact string session token
pub const STRING_SESSION_VERSION: u8 = b'1';

/// Default data-center port
pub const DEFAULT_DC_PORT: u16 = 443;

/// Namespace prefix for keys written by the key-value session backends
pub const SESSION_KV_PREFIX: &str = "telegraphe:session";
