use serde::Deserialize;
use uuid::Uuid;

/// Query for `GET /projects`. `highlight` arrives as the strings
/// "true"/"false" from the frontend; anything else means no filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<Uuid>,
    pub highlight: Option<String>,
}

impl ListQuery {
    pub fn highlight_filter(&self) -> Option<bool> {
        match self.highlight.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct KeywordsQuery {
    #[serde(default)]
    pub keywords: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_filter_parses_strings() {
        let q = ListQuery {
            user_id: None,
            highlight: Some("true".into()),
        };
        assert_eq!(q.highlight_filter(), Some(true));

        let q = ListQuery {
            user_id: None,
            highlight: Some("false".into()),
        };
        assert_eq!(q.highlight_filter(), Some(false));

        let q = ListQuery {
            user_id: None,
            highlight: Some("yes".into()),
        };
        assert_eq!(q.highlight_filter(), None);

        let q = ListQuery {
            user_id: None,
            highlight: None,
        };
        assert_eq!(q.highlight_filter(), None);
    }
}
