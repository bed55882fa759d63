use serde::{Deserialize, Serialize};

/// Envelope returned by detail, create, update, delete and health endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    #[serde(alias = "sucesso")]
    pub success: bool,
    #[serde(default, alias = "mensagem", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, alias = "dados", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, alias = "erros", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            errors: Vec::new(),
        }
    }
}

/// Envelope returned by the listing and search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(alias = "sucesso")]
    pub success: bool,
    #[serde(default = "Vec::new", alias = "dados")]
    pub data: Vec<T>,
    #[serde(default, alias = "paginacao", skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, alias = "termoBusca", skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(default, alias = "mensagem", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, alias = "erros", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl<T> ListResponse<T> {
    pub fn page(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(pagination),
            search_term: None,
            message: None,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "first_page", alias = "paginaAtual")]
    pub current_page: u32,
    #[serde(default = "first_page", alias = "totalPaginas")]
    pub total_pages: u32,
    #[serde(default, alias = "totalPosts")]
    pub total_count: u64,
    #[serde(default, alias = "postsPorPagina")]
    pub page_size: u32,
}

fn first_page() -> u32 {
    1
}

impl Pagination {
    /// Builds the metadata a well-behaved backend reports for `total_count`
    /// records split into pages of `page_size`.
    pub fn for_count(current_page: u32, total_count: u64, page_size: u32) -> Self {
        let total_pages = total_pages_for(total_count, page_size);
        Self {
            current_page: current_page.clamp(1, total_pages),
            total_pages,
            total_count,
            page_size: page_size.max(1),
        }
    }

    /// Enforces `total_pages >= 1` and `1 <= current_page <= total_pages`.
    pub fn normalized(self) -> Self {
        let total_pages = self.total_pages.max(1);
        Self {
            current_page: self.current_page.clamp(1, total_pages),
            total_pages,
            total_count: self.total_count,
            page_size: self.page_size.max(1),
        }
    }
}

/// `ceil(total_count / page_size)`, never less than one page.
pub fn total_pages_for(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Query parameters for the plain listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            filters: Vec::new(),
        }
    }

    pub fn with_filters(mut self, filters: Vec<(String, String)>) -> Self {
        self.filters = filters;
        self
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        params.extend(self.filters.iter().cloned());
        params
    }
}

/// Query parameter names the posts listing endpoint reads its filters from,
/// e.g. `autor` and `disciplina` on a Portuguese-language backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterKeys {
    pub author: String,
    pub subject: String,
}

impl Default for FilterKeys {
    fn default() -> Self {
        Self {
            author: "author".into(),
            subject: "subject".into(),
        }
    }
}

/// Listing filters the posts endpoint understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub author: Option<String>,
    pub subject: Option<String>,
}

impl PostFilter {
    pub fn into_pairs(self, keys: &FilterKeys) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(author) = self.author.filter(|v| !v.trim().is_empty()) {
            pairs.push((keys.author.clone(), author));
        }
        if let Some(subject) = self.subject.filter(|v| !v.trim().is_empty()) {
            pairs.push((keys.subject.clone(), subject));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfessor {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessorChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Post;

    #[test]
    fn total_pages_rounds_up_and_never_drops_below_one() {
        assert_eq!(total_pages_for(25, 10), 3);
        assert_eq!(total_pages_for(20, 10), 2);
        assert_eq!(total_pages_for(0, 10), 1);
        assert_eq!(total_pages_for(5, 0), 1);
    }

    #[test]
    fn normalizes_zero_total_pages_reported_for_empty_collections() {
        let pagination = Pagination {
            current_page: 0,
            total_pages: 0,
            total_count: 0,
            page_size: 10,
        }
        .normalized();
        assert_eq!(pagination.total_pages, 1);
        assert_eq!(pagination.current_page, 1);
    }

    #[test]
    fn decodes_portuguese_list_envelope() {
        let raw = r#"{
            "sucesso": true,
            "dados": [{
                "_id": "p1",
                "titulo": "Frações",
                "conteudo": "Introdução às frações",
                "autor": "Prof. Ana",
                "disciplina": "Matemática",
                "dataCriacao": "2024-03-01T10:00:00Z",
                "dataAtualizacao": "2024-03-02T10:00:00Z"
            }],
            "paginacao": {"paginaAtual": 1, "totalPaginas": 3, "totalPosts": 25, "postsPorPagina": 10},
            "termoBusca": "fra"
        }"#;
        let response: ListResponse<Post> = serde_json::from_str(raw).expect("decode");
        assert!(response.success);
        assert_eq!(response.data[0].title, "Frações");
        assert_eq!(response.data[0].subject.as_deref(), Some("Matemática"));
        assert_eq!(response.search_term.as_deref(), Some("fra"));
        let pagination = response.pagination.expect("pagination");
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.total_count, 25);
    }

    #[test]
    fn decodes_failure_envelope_with_field_errors() {
        let raw = r#"{"success": false, "message": "invalid", "errors": ["title too short", "body missing"]}"#;
        let response: ApiResponse<Post> = serde_json::from_str(raw).expect("decode");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.errors.len(), 2);
    }

    #[test]
    fn post_filter_skips_blank_values() {
        let pairs = PostFilter {
            author: Some("Ana".to_string()),
            subject: Some("  ".to_string()),
        }
        .into_pairs(&FilterKeys::default());
        assert_eq!(pairs, vec![("author".to_string(), "Ana".to_string())]);
    }

    #[test]
    fn post_filter_uses_configured_parameter_names() {
        let keys = FilterKeys {
            author: "autor".to_string(),
            subject: "disciplina".to_string(),
        };
        let pairs = PostFilter {
            author: Some("Ana".to_string()),
            subject: Some("Matemática".to_string()),
        }
        .into_pairs(&keys);
        assert_eq!(
            pairs,
            vec![
                ("autor".to_string(), "Ana".to_string()),
                ("disciplina".to_string(), "Matemática".to_string()),
            ]
        );
    }

    #[test]
    fn changes_omit_absent_fields() {
        let json = serde_json::to_value(StudentChanges {
            class_name: Some("9A".to_string()),
            ..StudentChanges::default()
        })
        .expect("encode");
        assert_eq!(json, serde_json::json!({"className": "9A"}));
    }
}
