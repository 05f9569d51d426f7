//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Email,
    FullName,
    Role,
    PasswordHash,
    PasswordSalt,
    ApiKeyHash,
    CreatedAt,
}

#[derive(Iden)]
pub enum RefreshTokens {
    Table,
    Id,
    UserId,
    TokenHash,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
pub enum Podcasts {
    Table,
    Id,
    Title,
    HostName,
    HostEmail,
    Description,
    Category,
    WebsiteUrl,
    RssUrl,
    AudienceSize,
    Language,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Campaigns {
    Table,
    Id,
    UserId,
    Name,
    Status,
    Goals,
    TargetAudience,
    Keywords,
    Bio,
    Angles,
    Links,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum QuestionnaireResponses {
    Table,
    Id,
    CampaignId,
    UserId,
    Answers,
    SubmittedAt,
}

#[derive(Iden)]
pub enum MediaKits {
    Table,
    Id,
    CampaignId,
    Slug,
    Headline,
    Bio,
    TalkingPoints,
    Achievements,
    HeadshotUrl,
    IsPublic,
    UpdatedAt,
}

#[derive(Iden)]
pub enum MatchSuggestions {
    Table,
    Id,
    CampaignId,
    PodcastId,
    Score,
    MatchedKeywords,
    Status,
    ReviewedBy,
    ReviewedAt,
    CreatedAt,
}

#[derive(Iden)]
pub enum Pitches {
    Table,
    Id,
    CampaignId,
    PodcastId,
    MatchId,
    TemplateId,
    Subject,
    Body,
    Status,
    MessageId,
    SentAt,
    RepliedAt,
    ReplySnippet,
    SendingSince,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    UserId,
    PodcastId,
    CampaignId,
    PitchId,
    Status,
    ScheduledAt,
    EpisodeUrl,
    Notes,
    CreatedAt,
    UpdatedAt,
}
