//! HTML fragments written into the content region while a search progresses.

pub const WAITING_BASE: &str = "generando índice";
pub const SEARCHING_BASE: &str = "buscando";
pub const NOTHING_FOUND: &str = "<h2>No se encontró nada para lo ingresado!</h2>";

const WAITING_BANNER: &str = "<h1><font color=\"#0000cc\" size=\"+1\">Por favor, aguarde mientras CDpedia termina de cargar el índice</font></h1><br/>";

/// A status line that grows one dot per poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    base: &'static str,
    text: String,
}

impl StatusMessage {
    pub fn new(base: &'static str) -> Self {
        Self {
            base,
            text: base.to_string(),
        }
    }

    pub fn waiting() -> Self {
        Self::new(WAITING_BASE)
    }

    pub fn searching() -> Self {
        Self::new(SEARCHING_BASE)
    }

    pub fn tick(&mut self) -> &str {
        self.text.push('.');
        &self.text
    }

    pub fn reset(&mut self) {
        self.text = self.base.to_string();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

pub fn header(query: &str) -> String {
    format!("<h2>Resultados para: {}</h2>", escape_html(query))
}

pub fn waiting_page(waiting: &StatusMessage) -> String {
    format!("{WAITING_BANNER}<i>{}</i>", waiting.as_str())
}

pub fn search_started_page(query: &str) -> String {
    format!("{} <br/> <i>{SEARCHING_BASE}</i><br/>", header(query))
}

pub fn progress_page(query: &str, searching: &StatusMessage, complete: &str, detailed: &str) -> String {
    format!(
        "{}<i>{}</i><br/>{complete}{detailed}",
        header(query),
        searching.as_str()
    )
}

pub fn final_page(query: &str, complete: &str, detailed: &str) -> String {
    if complete.is_empty() && detailed.is_empty() {
        NOTHING_FOUND.to_string()
    } else {
        format!("{}<br/>{complete}{detailed}", header(query))
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_accumulates_dots_until_reset() {
        let mut message = StatusMessage::searching();
        assert_eq!(message.tick(), "buscando.");
        assert_eq!(message.tick(), "buscando..");
        message.reset();
        assert_eq!(message.as_str(), "buscando");
    }

    #[test]
    fn waiting_page_shows_banner_and_progress() {
        let mut waiting = StatusMessage::waiting();
        waiting.tick();
        let html = waiting_page(&waiting);
        assert!(html.starts_with("<h1>"));
        assert!(html.ends_with("<i>generando índice.</i>"));
    }

    #[test]
    fn final_page_without_payloads_is_nothing_found() {
        assert_eq!(final_page("perro", "", ""), NOTHING_FOUND);
    }

    #[test]
    fn final_page_is_header_plus_payloads() {
        let html = final_page("perro", "<ul>a</ul>", "<ul>b</ul>");
        assert_eq!(html, "<h2>Resultados para: perro</h2><br/><ul>a</ul><ul>b</ul>");
        assert!(!html.contains(SEARCHING_BASE));
    }

    #[test]
    fn progress_page_keeps_partial_payload() {
        let mut searching = StatusMessage::searching();
        searching.tick();
        let html = progress_page("perro", &searching, "<ul>a</ul>", "");
        assert_eq!(
            html,
            "<h2>Resultados para: perro</h2><i>buscando.</i><br/><ul>a</ul>"
        );
    }

    #[test]
    fn query_is_escaped_in_header() {
        assert_eq!(
            header("<b>\"tom & jerry\"</b>"),
            "<h2>Resultados para: &lt;b&gt;&quot;tom &amp; jerry&quot;&lt;/b&gt;</h2>"
        );
    }
}
