/// Application name
pub const APP_NAME: &str = "Forkful";

/// Characters that terminate a label in delimited label input
pub const LABEL_DELIMITERS: [char; 2] = [',', '\n'];

/// Maximum uploaded image size in bytes (10 MiB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Place category used to restrict places autocomplete
pub const PLACES_CATEGORY: &str = "restaurant";

/// Capacity of the realtime change broadcast channel
pub const REALTIME_CHANNEL_CAPACITY: usize = 64;
