//! Stylesheet and rule traversal.
//!
//! The page serialises `document.styleSheets` into the tagged [`CssRule`] tree;
//! everything else here is pure. Each pass takes a fresh [`snapshot`] since
//! the CSSOM can change between passes, and rule ids are only valid for the
//! snapshot that produced them.

use serde::Deserialize;

use crate::browser::{evaluate_as, scripts, PageContext};
use crate::Result;

/// Index of a style rule in the page's rule registry for one snapshot.
pub type RuleId = u32;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StyleSheet {
    #[serde(default)]
    pub href: Option<String>,
    /// `None` when the page refused access to `cssRules` (cross-origin).
    pub rules: Option<Vec<CssRule>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CssRule {
    Style(StyleRule),
    Group(GroupRule),
    Import(ImportRule),
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRule {
    pub id: RuleId,
    pub selector: String,
    /// The `animation` shorthand, when non-empty.
    #[serde(default)]
    pub animation: Option<String>,
    #[serde(default)]
    pub declares_breaks: bool,
}

impl StyleRule {
    pub fn is_animated(&self) -> bool {
        self.animation.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

/// A conditional block such as `@media` or `@supports`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupRule {
    /// Media condition segments; `None` for non-media groups.
    #[serde(default)]
    pub media: Option<Vec<String>>,
    #[serde(default)]
    pub rules: Vec<CssRule>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportRule {
    pub sheet: Option<StyleSheet>,
}

/// Flattened, ordered view over a document's sheets and their imports.
#[derive(Debug, Clone)]
pub struct StyleSheetSet<'a> {
    sheets: Vec<&'a StyleSheet>,
}

impl<'a> StyleSheetSet<'a> {
    /// Expands `@import`ed sheets depth-first after the sheet importing them.
    /// Sheets with inaccessible rules contribute nothing.
    pub fn flatten(sheets: &'a [StyleSheet]) -> Self {
        let mut flat = Vec::new();
        for sheet in sheets {
            push_with_imports(sheet, &mut flat);
        }
        Self { sheets: flat }
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a StyleSheet> + '_ {
        self.sheets.iter().copied()
    }

    /// Calls `visitor` for every style rule in document order, descending into
    /// group rules. Import and other rules are not visited.
    pub fn for_each_style_rule<F>(&self, mut visitor: F)
    where
        F: FnMut(&'a StyleRule),
    {
        for sheet in self.sheets.iter().copied() {
            if let Some(rules) = &sheet.rules {
                visit_style_rules(rules, &mut visitor);
            }
        }
    }

    /// Calls `visitor` for every group rule, outer groups before nested ones.
    pub fn for_each_group_rule<F>(&self, mut visitor: F)
    where
        F: FnMut(&'a GroupRule),
    {
        for sheet in self.sheets.iter().copied() {
            if let Some(rules) = &sheet.rules {
                visit_group_rules(rules, &mut visitor);
            }
        }
    }
}

fn push_with_imports<'a>(sheet: &'a StyleSheet, flat: &mut Vec<&'a StyleSheet>) {
    let Some(rules) = &sheet.rules else {
        log::debug!(
            "skipping stylesheet with inaccessible rules: {}",
            sheet.href.as_deref().unwrap_or("<inline>")
        );
        return;
    };
    flat.push(sheet);
    for rule in rules {
        if let CssRule::Import(ImportRule {
            sheet: Some(imported),
        }) = rule
        {
            push_with_imports(imported, flat);
        }
    }
}

fn visit_style_rules<'a, F>(rules: &'a [CssRule], visitor: &mut F)
where
    F: FnMut(&'a StyleRule),
{
    for rule in rules {
        match rule {
            CssRule::Style(style) => visitor(style),
            CssRule::Group(group) => visit_style_rules(&group.rules, visitor),
            CssRule::Import(_) | CssRule::Other => {}
        }
    }
}

fn visit_group_rules<'a, F>(rules: &'a [CssRule], visitor: &mut F)
where
    F: FnMut(&'a GroupRule),
{
    for rule in rules {
        if let CssRule::Group(group) = rule {
            visitor(group);
            visit_group_rules(&group.rules, visitor);
        }
    }
}

/// Serialises the page's stylesheets and registers their style rules.
pub async fn snapshot(page: &dyn PageContext) -> Result<Vec<StyleSheet>> {
    evaluate_as(page, &scripts::stylesheets()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sheets(value: serde_json::Value) -> Vec<StyleSheet> {
        serde_json::from_value(value).expect("valid stylesheet snapshot")
    }

    #[test]
    fn nested_groups_visit_style_rules_in_document_order() {
        let doc = sheets(json!([{
            "href": null,
            "rules": [{
                "kind": "group",
                "media": ["screen"],
                "rules": [
                    { "kind": "style", "id": 0, "selector": ".outer" },
                    {
                        "kind": "group",
                        "media": ["(max-width: 600px)"],
                        "rules": [{ "kind": "style", "id": 1, "selector": ".inner" }]
                    }
                ]
            }]
        }]));

        let set = StyleSheetSet::flatten(&doc);
        let mut seen = Vec::new();
        set.for_each_style_rule(|rule| seen.push(rule.selector.clone()));
        assert_eq!(seen, vec![".outer", ".inner"]);
    }

    #[test]
    fn imports_follow_their_importing_sheet() {
        let doc = sheets(json!([
            {
                "href": "a.css",
                "rules": [
                    { "kind": "import", "sheet": {
                        "href": "b.css",
                        "rules": [{ "kind": "import", "sheet": { "href": "c.css", "rules": [] } }]
                    }},
                    { "kind": "style", "id": 0, "selector": "body" }
                ]
            },
            { "href": "d.css", "rules": [] }
        ]));

        let set = StyleSheetSet::flatten(&doc);
        let order: Vec<_> = set.iter().map(|s| s.href.as_deref().unwrap()).collect();
        assert_eq!(order, vec!["a.css", "b.css", "c.css", "d.css"]);
    }

    #[test]
    fn inaccessible_sheets_contribute_nothing() {
        let doc = sheets(json!([
            { "href": "https://cdn.example/x.css", "rules": null },
            { "href": null, "rules": [
                { "kind": "import", "sheet": { "href": "https://cdn.example/y.css", "rules": null } },
                { "kind": "import", "sheet": null },
                { "kind": "style", "id": 4, "selector": "p" }
            ]}
        ]));

        let set = StyleSheetSet::flatten(&doc);
        assert_eq!(set.len(), 1);
        let mut ids = Vec::new();
        set.for_each_style_rule(|rule| ids.push(rule.id));
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn other_and_import_rules_are_not_visited() {
        let doc = sheets(json!([{ "href": null, "rules": [
            { "kind": "other" },
            { "kind": "import", "sheet": { "href": "i.css", "rules": [
                { "kind": "style", "id": 1, "selector": "h1" }
            ]}},
            { "kind": "style", "id": 2, "selector": "h2" }
        ]}]));

        let set = StyleSheetSet::flatten(&doc);
        let mut ids = Vec::new();
        set.for_each_style_rule(|rule| ids.push(rule.id));
        // h1 is reached through the flattened imported sheet, not the import rule.
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn group_rules_are_visited_outer_first() {
        let doc = sheets(json!([{ "href": null, "rules": [
            { "kind": "group", "media": ["print"], "rules": [
                { "kind": "group", "media": null, "rules": [] }
            ]},
            { "kind": "group", "media": ["(max-width: 900px)"], "rules": [] }
        ]}]));

        let set = StyleSheetSet::flatten(&doc);
        let mut media = Vec::new();
        set.for_each_group_rule(|group| media.push(group.media.clone()));
        assert_eq!(
            media,
            vec![
                Some(vec!["print".to_string()]),
                None,
                Some(vec!["(max-width: 900px)".to_string()])
            ]
        );
    }

    #[test]
    fn animation_shorthand_must_be_non_empty() {
        let rule = |animation: Option<&str>| StyleRule {
            id: 0,
            selector: ".x".to_string(),
            animation: animation.map(str::to_string),
            declares_breaks: false,
        };
        assert!(rule(Some("spin 1s infinite")).is_animated());
        assert!(!rule(Some("")).is_animated());
        assert!(!rule(None).is_animated());
    }
}
