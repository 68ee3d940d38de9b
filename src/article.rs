//! Wiki markup for a single project page.

use crate::dataset::ProjectRecord;

/// Characters that may not appear in a page title or a summary file name.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replaces every illegal character with `_`. The result has as many
/// characters as the input and is the key summaries are stored under.
pub fn sanitize_title(name: &str) -> String {
    name.replace(ILLEGAL, "_")
}

/// The sanitized title in the underscore form the wiki uses internally, for
/// the heading and link label.
pub fn heading_title(name: &str) -> String {
    sanitize_title(name).replace(char::is_whitespace, "_")
}

pub fn format(title: &str, summary: &str, website: &str) -> String {
    format!(
        "= {title} =\n\
         \n\
         {summary}\n\
         \n\
         == External Links ==\n\
         * [{website} {title} Website]\n"
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WikiArticle {
    /// Page title on the wiki, the project name as given in the dataset.
    pub title: String,
    pub content: String,
}

impl WikiArticle {
    pub fn compose(project: &ProjectRecord, summary: &str) -> Self {
        WikiArticle {
            title: project.name.clone(),
            content: format(&heading_title(&project.name), summary, &project.website),
        }
    }
}
