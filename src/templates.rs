use maud::{DOCTYPE, Markup, html};

pub fn not_found_page(message: &str) -> String {
    let mut parts = message.split(':').map(str::trim).filter(|p| !p.is_empty());
    let heading = parts.next().unwrap_or("404 Not Found");
    let details = parts.collect::<Vec<_>>();

    page(
        "Page Not Found",
        html! {
            main class="container" {
                h1 { (heading) }
                @for detail in &details {
                    p { (detail) }
                }
                a href="/" { "Back to the home page" }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body { (body) }
        }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NOT_FOUND_MESSAGE;

    #[test]
    fn splits_the_error_on_colons() {
        let html = not_found_page(NOT_FOUND_MESSAGE);
        assert!(html.contains("<h1>404 Not Found</h1>"));
        assert!(html.contains("<p>The requested URL was not found on the server."));
    }

    #[test]
    fn escapes_the_message() {
        let html = not_found_page("404: <script>");
        assert!(html.contains("&lt;script&gt;"));
    }
}
