//! Onboarding interest catalog.

const INTEREST_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Politics",
        &[
            "Parliament",
            "Elections",
            "Judiciary",
            "International Relations",
            "State Politics",
        ],
    ),
    (
        "Technology",
        &["AI & ML", "Startups", "Gadgets", "Fintech", "Space Tech", "Telecom"],
    ),
    (
        "Business",
        &["Markets", "Economy", "Startups", "Real Estate", "Banking", "Corporate"],
    ),
    (
        "Sports",
        &["Cricket", "Football", "Tennis", "Olympics", "Kabaddi", "Motorsport"],
    ),
    (
        "Entertainment",
        &["Bollywood", "OTT", "Music", "Television", "Regional Cinema"],
    ),
    (
        "Science",
        &["Space", "Health", "Environment", "Research", "Climate"],
    ),
    (
        "World",
        &["USA", "China", "Europe", "Middle East", "Southeast Asia"],
    ),
    (
        "Lifestyle",
        &["Travel", "Food", "Fashion", "Wellness", "Automobiles"],
    ),
];

/// Categories offered during onboarding, with their subcategories.
#[must_use]
pub fn interest_categories() -> &'static [(&'static str, &'static [&'static str])] {
    INTEREST_CATEGORIES
}

#[must_use]
pub fn subcategories(category: &str) -> Option<&'static [&'static str]> {
    INTEREST_CATEGORIES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, subs)| *subs)
}
