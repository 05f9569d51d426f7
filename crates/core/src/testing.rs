//! Fixture builders shared by unit tests.

use crate::generate::ClientBrief;
use crate::matching::{CampaignProfile, PodcastProfile};

pub fn campaign(keywords: &[&str]) -> CampaignProfile {
    CampaignProfile {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    }
}

pub fn podcast(title: &str, description: Option<&str>, category: Option<&str>) -> PodcastProfile {
    PodcastProfile {
        title: title.to_string(),
        description: description.map(str::to_string),
        category: category.map(str::to_string),
    }
}

pub fn brief(client_name: &str, keywords: &[&str]) -> ClientBrief {
    ClientBrief {
        client_name: client_name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        ..Default::default()
    }
}
