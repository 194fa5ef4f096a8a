//! Human-readable labels for tool traffic.
//!
//! The agent plans with a fixed set of map tools. Each request gets a short,
//! stable phrase; unknown tools fall back to a generic one.

use guide_protocol::ToolCall;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const AROUND_SEARCH_TOOL: &str = "maps_around_search";

static TOOL_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("maps_text_search", "Searching for destination..."),
        ("maps_direction_driving", "Planning driving route..."),
        ("maps_weather", "Checking the weather..."),
        ("maps_geo", "Locating attraction coordinates..."),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCategory {
    Cuisine,
    Lodging,
    Sightseeing,
}

const CATEGORIES: [SearchCategory; 3] = [
    SearchCategory::Cuisine,
    SearchCategory::Lodging,
    SearchCategory::Sightseeing,
];

impl SearchCategory {
    // Keywords arrive in whatever language the agent prompts the map API with.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            SearchCategory::Cuisine => &["美食", "餐厅", "food", "restaurant", "restaurants", "cuisine"],
            SearchCategory::Lodging => &["酒店", "住宿", "hotel", "hotels", "lodging", "accommodation"],
            SearchCategory::Sightseeing => &["景点", "attraction", "attractions", "sights", "sightseeing"],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SearchCategory::Cuisine => "Searching for local food...",
            SearchCategory::Lodging => "Searching for places to stay...",
            SearchCategory::Sightseeing => "Searching for attractions...",
        }
    }
}

pub fn search_category(keyword: &str) -> Option<SearchCategory> {
    let keyword = keyword.trim().to_lowercase();
    CATEGORIES
        .into_iter()
        .find(|category| category.keywords().contains(&keyword.as_str()))
}

/// Label for an assistant turn whose first requested tool is `call`.
pub fn tool_label(call: &ToolCall) -> String {
    let name = call.name.trim();
    if name.is_empty() {
        return "Running tool call...".to_string();
    }

    if name == AROUND_SEARCH_TOOL {
        let keyword = call
            .args
            .get("keywords")
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(keyword) = keyword {
            return match search_category(keyword) {
                Some(category) => category.label().to_string(),
                None => format!("Searching for {}...", keyword),
            };
        }
    }

    match TOOL_LABELS.get(name) {
        Some(label) => label.to_string(),
        None => running_label(name),
    }
}

fn running_label(name: &str) -> String {
    format!("Running {}...", name)
}

/// Label for a tool result.
pub fn tool_result_label(name: Option<&str>) -> String {
    let name = name
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown");
    format!("Tool {} succeeded", name)
}
