mod presence;

pub use presence::DiscordTransport;
