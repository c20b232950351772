#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleOption {
    pub name: &'static str,
    pub preview_ref: &'static str,
}

pub const DESIGN_STYLES: &[StyleOption] = &[
    StyleOption { name: "Mid-Century Modern", preview_ref: "https://picsum.photos/seed/mcm/400/300" },
    StyleOption { name: "Scandinavian", preview_ref: "https://picsum.photos/seed/scandi/400/300" },
    StyleOption { name: "Industrial", preview_ref: "https://picsum.photos/seed/industrial/400/300" },
    StyleOption { name: "Bohemian", preview_ref: "https://picsum.photos/seed/boho/400/300" },
    StyleOption { name: "Minimalist", preview_ref: "https://picsum.photos/seed/minimal/400/300" },
    StyleOption { name: "Coastal", preview_ref: "https://picsum.photos/seed/coastal/400/300" },
    StyleOption { name: "Farmhouse", preview_ref: "https://picsum.photos/seed/farmhouse/400/300" },
];

/// Resolves a 1-based catalog index or a case-insensitive style name.
pub fn find_style(query: &str) -> Option<&'static StyleOption> {
    let query = query.trim();
    if let Ok(n) = query.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| DESIGN_STYLES.get(i));
    }
    DESIGN_STYLES
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (i, a) in DESIGN_STYLES.iter().enumerate() {
            for b in &DESIGN_STYLES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn finds_by_name_or_index() {
        assert_eq!(find_style("scandinavian").map(|s| s.name), Some("Scandinavian"));
        assert_eq!(find_style(" 1 ").map(|s| s.name), Some("Mid-Century Modern"));
        assert_eq!(find_style("7").map(|s| s.name), Some("Farmhouse"));
        assert!(find_style("0").is_none());
        assert!(find_style("8").is_none());
        assert!(find_style("Baroque").is_none());
    }
}
