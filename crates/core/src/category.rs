use thiserror::Error;

/// Content categories reported by the gateway agent. A category's position in
/// this list is its bit position in a category bitmask.
pub const AGENT_CATEGORIES: [&str; 13] = [
    "general",
    "adult content",
    "alcohol tobacco and narcotics",
    "electronic commerce",
    "gambling",
    "religious associations",
    "social networking",
    "violence",
    "weapons",
    "social media",
    "media streaming",
    "gaming content",
    "advertisements",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),
    #[error("invalid category bitmask: {0}")]
    InvalidBitmask(u32),
}

pub type Result<T> = std::result::Result<T, CategoryError>;

fn category_position(name: &str) -> Result<u32> {
    AGENT_CATEGORIES
        .iter()
        .position(|category| *category == name)
        .map(|position| position as u32)
        .ok_or_else(|| CategoryError::UnknownCategory(name.to_string()))
}

/// Bitmask for a single category.
pub fn category_to_bitmask(name: &str) -> Result<u32> {
    Ok(1 << category_position(name)?)
}

/// Encodes a set of category names. Repeated names set the same bit once.
pub fn categories_to_bitmask<I, S>(names: I) -> Result<u32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut bitmask = 0u32;
    for name in names {
        bitmask |= category_to_bitmask(name.as_ref())?;
    }
    Ok(bitmask)
}

/// Decodes a bitmask into category names, highest bit position first.
///
/// Zero and bitmasks with bits beyond the vocabulary are rejected.
pub fn bitmask_to_categories(bitmask: u32) -> Result<Vec<&'static str>> {
    if bitmask == 0 || bitmask >> AGENT_CATEGORIES.len() != 0 {
        return Err(CategoryError::InvalidBitmask(bitmask));
    }
    let mut remaining = bitmask;
    let mut categories = Vec::with_capacity(bitmask.count_ones() as usize);
    while !remaining.is_power_of_two() {
        let position = remaining.ilog2();
        remaining -= 1 << position;
        categories.push(AGENT_CATEGORIES[position as usize]);
    }
    categories.push(AGENT_CATEGORIES[remaining.ilog2() as usize]);
    Ok(categories)
}
