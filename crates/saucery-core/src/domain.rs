/// Discord user id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// Discord channel id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// Discord message id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

/// Discord guild id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuildId(pub u64);

/// A stable reference to a Discord message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

const MB: usize = 1024 * 1024;

/// Guild boost tier, which sets the attachment size ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadTier {
    #[default]
    None,
    Tier1,
    Tier2,
    Tier3,
}

impl UploadTier {
    pub fn upload_limit(self) -> usize {
        match self {
            UploadTier::None | UploadTier::Tier1 => 8 * MB,
            UploadTier::Tier2 => 50 * MB,
            UploadTier::Tier3 => 100 * MB,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limits_per_tier() {
        assert_eq!(UploadTier::None.upload_limit(), 8 * MB);
        assert_eq!(UploadTier::Tier1.upload_limit(), 8 * MB);
        assert_eq!(UploadTier::Tier2.upload_limit(), 50 * MB);
        assert_eq!(UploadTier::Tier3.upload_limit(), 100 * MB);
    }
}
