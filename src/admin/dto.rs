use serde::Deserialize;

use crate::users::service::ListParams;

/// `?page=&limit=&search=` as sent by the admin table. Unparsable numbers fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

impl From<ListQuery> for ListParams {
    fn from(q: ListQuery) -> Self {
        let num = |v: Option<String>| v.and_then(|s| s.trim().parse::<i64>().ok());
        ListParams::new(num(q.page), num(q.limit), q.search)
    }
}
