//! Ordered provider-classification → [`EventCategory`] rules.
//!
//! Each provider gets its own table. Rules are checked top to bottom and the
//! first one whose field contains the needle (case-insensitive) wins.

use outing_shared::EventCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassField {
    Segment,
    Genre,
    Category,
    Subcategory,
}

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub field: ClassField,
    pub needle: &'static str,
    pub category: EventCategory,
}

const fn rule(field: ClassField, needle: &'static str, category: EventCategory) -> CategoryRule {
    CategoryRule {
        field,
        needle,
        category,
    }
}

pub const TICKETMASTER_RULES: &[CategoryRule] = &[
    rule(ClassField::Segment, "sports", EventCategory::Sports),
    rule(ClassField::Genre, "comedy", EventCategory::Comedy),
    rule(ClassField::Genre, "concert", EventCategory::Concert),
    rule(ClassField::Segment, "music", EventCategory::Concert),
    rule(ClassField::Genre, "theatre", EventCategory::Theater),
    rule(ClassField::Segment, "arts", EventCategory::Theater),
    rule(ClassField::Segment, "family", EventCategory::Family),
    rule(ClassField::Genre, "family", EventCategory::Family),
];

pub const EVENTBRITE_RULES: &[CategoryRule] = &[
    rule(ClassField::Subcategory, "comedy", EventCategory::Comedy),
    rule(ClassField::Category, "music", EventCategory::Concert),
    rule(ClassField::Category, "sports", EventCategory::Sports),
    rule(ClassField::Category, "food", EventCategory::Food),
    rule(ClassField::Category, "performing", EventCategory::Theater),
    rule(ClassField::Category, "film", EventCategory::Arts),
    rule(ClassField::Category, "arts", EventCategory::Arts),
    rule(ClassField::Category, "family", EventCategory::Family),
    rule(ClassField::Category, "nightlife", EventCategory::Nightlife),
    rule(ClassField::Category, "community", EventCategory::Community),
    rule(ClassField::Category, "charity", EventCategory::Community),
];

/// First matching rule's category, or [`EventCategory::General`].
pub fn classify(rules: &[CategoryRule], fields: &[(ClassField, Option<&str>)]) -> EventCategory {
    for rule in rules {
        let matched = fields.iter().any(|(field, value)| {
            *field == rule.field
                && value
                    .map(|v| v.to_lowercase().contains(rule.needle))
                    .unwrap_or(false)
        });
        if matched {
            return rule.category;
        }
    }
    EventCategory::General
}

/// Ticketmaster `classificationName` hint for a category filter.
pub fn ticketmaster_classification(category: EventCategory) -> Option<&'static str> {
    match category {
        EventCategory::Sports => Some("sports"),
        EventCategory::Concert => Some("music"),
        EventCategory::Theater | EventCategory::Arts => Some("arts & theatre"),
        EventCategory::Comedy => Some("comedy"),
        EventCategory::Family => Some("family"),
        _ => None,
    }
}

/// Eventbrite top-level category id for a category filter.
pub fn eventbrite_category_id(category: EventCategory) -> Option<&'static str> {
    match category {
        EventCategory::Concert => Some("103"),
        EventCategory::Theater | EventCategory::Arts => Some("105"),
        EventCategory::Sports => Some("108"),
        EventCategory::Food => Some("110"),
        EventCategory::Community => Some("113"),
        EventCategory::Family => Some("115"),
        _ => None,
    }
}
