use client_core::ListState;
use shared::{
    display::{format_date, tag_summary, truncate_text, CARD_SUMMARY_LEN, ROW_SUMMARY_LEN},
    domain::{Entity, Post, Professor, Student},
};

/// Plain-text views of a record for terminal output.
pub trait Render {
    fn row(&self) -> String;
    fn detail(&self) -> String;
}

impl Render for Post {
    fn row(&self) -> String {
        format!(
            "{}  {}  ({}, {})  {}",
            self.id,
            truncate_text(&self.title, ROW_SUMMARY_LEN),
            self.author,
            format_date(&self.created_at),
            truncate_text(&self.body, ROW_SUMMARY_LEN),
        )
    }

    fn detail(&self) -> String {
        let mut out = format!(
            "{}\nby {} on {}\n",
            self.title,
            self.author,
            format_date(&self.created_at)
        );
        if let Some(subject) = &self.subject {
            out.push_str(&format!("subject: {subject}\n"));
        }
        if let Some(tags) = self.tags.as_deref().filter(|tags| !tags.is_empty()) {
            out.push_str(&format!("tags: {}\n", tag_summary(tags)));
        }
        if self.updated_at != self.created_at {
            out.push_str(&format!("updated {}\n", format_date(&self.updated_at)));
        }
        out.push('\n');
        out.push_str(&truncate_text(&self.body, CARD_SUMMARY_LEN));
        out
    }
}

impl Render for Professor {
    fn row(&self) -> String {
        format!(
            "{}  {}  <{}>  {}",
            self.id,
            self.name,
            self.email,
            self.subject.as_deref().unwrap_or("-")
        )
    }

    fn detail(&self) -> String {
        format!(
            "{}\nemail: {}\nsubject: {}\nsince {}",
            self.name,
            self.email,
            self.subject.as_deref().unwrap_or("-"),
            format_date(&self.created_at)
        )
    }
}

impl Render for Student {
    fn row(&self) -> String {
        format!(
            "{}  {}  <{}>  {}",
            self.id,
            self.name,
            self.email,
            self.class_name.as_deref().unwrap_or("-")
        )
    }

    fn detail(&self) -> String {
        format!(
            "{}\nemail: {}\nclass: {}\nsince {}",
            self.name,
            self.email,
            self.class_name.as_deref().unwrap_or("-"),
            format_date(&self.created_at)
        )
    }
}

/// Rows followed by a pagination footer, or the empty-state line.
pub fn list_view<E: Entity + Render>(state: &ListState<E>) -> String {
    if state.items.is_empty() {
        return match &state.search_term {
            Some(term) => format!("No {}s match \"{term}\".", E::KIND.label()),
            None => format!("No {}s yet.", E::KIND.label()),
        };
    }
    let mut out: Vec<String> = state.items.iter().map(Render::row).collect();
    let mut footer = format!(
        "page {} of {} ({} total)",
        state.current_page, state.total_pages, state.total_count
    );
    if let Some(term) = &state.search_term {
        footer.push_str(&format!(", search \"{term}\""));
    }
    out.push(footer);
    out.join("\n")
}
