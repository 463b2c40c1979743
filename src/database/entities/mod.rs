pub mod asset_content_links;
pub mod asset_tag_links;
pub mod assets;
pub mod languoids;
pub mod profile_project_links;
pub mod profiles;
pub mod project_languoid_links;
pub mod projects;
pub mod quest_asset_links;
pub mod quest_tag_links;
pub mod quests;
pub mod tags;
