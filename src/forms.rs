//! Validation of the movie submission form.
//!
//! Fields are checked in declaration order and every failing field collects
//! its own messages, so a single submission can report several problems.

use axum::body::Bytes;

use crate::upload::secure_filename;

pub const TITLE: Field = Field { name: "title", label: "Movie Title" };
pub const DESCRIPTION: Field = Field { name: "description", label: "Movie Description" };
pub const POSTER: Field = Field { name: "poster", label: "Movie Poster" };
pub const CSRF_TOKEN: Field = Field { name: "csrf_token", label: "CSRF Token" };

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
}

#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

#[derive(Clone, Debug, Default)]
pub struct MovieForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub poster: Option<UploadedFile>,
}

#[derive(Clone, Debug)]
pub struct ValidationRules {
    pub title_max_len: usize,
    pub poster_extensions: Vec<String>,
}

/// A form that passed validation. `poster_filename` is already sanitized.
#[derive(Clone, Debug)]
pub struct ValidMovie {
    pub title: String,
    pub description: String,
    pub poster_filename: String,
    pub poster_data: Bytes,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FormErrors {
    fields: Vec<(Field, Vec<String>)>,
}

impl FormErrors {
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        let message = message.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field, vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(f, _)| f.name).collect()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.fields.iter().find(|(f, _)| f.name == name).map(|(_, m)| m.as_slice())
    }

    pub fn messages(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|(field, messages)| {
                messages.iter().map(move |m| field_message(*field, m))
            })
            .collect()
    }
}

pub fn field_message(field: Field, message: &str) -> String {
    format!("Error in the {} field - {}", field.label, message)
}

impl MovieForm {
    pub fn validate(self, rules: &ValidationRules) -> Result<ValidMovie, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            errors.add(TITLE, "The title is required");
        } else if title.chars().count() > rules.title_max_len {
            errors.add(
                TITLE,
                format!("The title cannot exceed {} characters", rules.title_max_len),
            );
        }

        let description = self.description.as_deref().map(str::trim).unwrap_or_default();
        if description.is_empty() {
            errors.add(DESCRIPTION, "A brief description is required");
        }

        let mut poster = None;
        match &self.poster {
            Some(file) if !file.filename.trim().is_empty() => {
                match secure_filename(&file.filename) {
                    Some(name) if has_allowed_extension(&name, &rules.poster_extensions) => {
                        poster = Some((name, file.data.clone()));
                    }
                    Some(_) => errors.add(POSTER, extension_message(&rules.poster_extensions)),
                    None => errors.add(POSTER, "The poster filename is not valid"),
                }
            }
            _ => errors.add(POSTER, "A movie poster is required"),
        }

        match poster {
            Some((poster_filename, poster_data)) if errors.is_empty() => Ok(ValidMovie {
                title: title.to_string(),
                description: description.to_string(),
                poster_filename,
                poster_data,
            }),
            _ => Err(errors),
        }
    }
}

fn has_allowed_extension(filename: &str, allowed: &[String]) -> bool {
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    allowed.iter().any(|a| *a == ext)
}

fn extension_message(allowed: &[String]) -> String {
    let names = allowed.iter().map(|e| e.to_ascii_uppercase()).collect::<Vec<_>>();
    let list = match names.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [rest @ .., last] => format!("{} or {}", rest.join(", "), last),
    };
    format!("Only image files ({list}) are allowed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ValidationRules {
        ValidationRules {
            title_max_len: 80,
            poster_extensions: vec!["jpg".to_string(), "png".to_string()],
        }
    }

    fn form(title: &str, description: &str, poster: &str) -> MovieForm {
        MovieForm {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            poster: Some(UploadedFile {
                filename: poster.to_string(),
                data: Bytes::from_static(b"\x89PNG"),
            }),
        }
    }

    #[test]
    fn accepts_a_complete_form() {
        let valid = form("  Alien ", "In space no one can hear you scream.", "alien.png")
            .validate(&rules())
            .unwrap();
        assert_eq!(valid.title, "Alien");
        assert_eq!(valid.poster_filename, "alien.png");
        assert_eq!(valid.poster_data.as_ref(), b"\x89PNG");
    }

    #[test]
    fn blank_title_is_reported_against_the_title_field() {
        let errors = form("   ", "desc", "a.jpg").validate(&rules()).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["The title is required"]);
        assert_eq!(
            errors.messages(),
            vec!["Error in the Movie Title field - The title is required".to_string()]
        );
    }

    #[test]
    fn overlong_title_is_rejected() {
        let errors = form(&"x".repeat(81), "desc", "a.jpg").validate(&rules()).unwrap_err();
        assert_eq!(errors.get("title").unwrap(), ["The title cannot exceed 80 characters"]);
    }

    #[test]
    fn gif_poster_is_rejected() {
        let errors = form("Heat", "desc", "heat.gif").validate(&rules()).unwrap_err();
        assert_eq!(
            errors.get("poster").unwrap(),
            ["Only image files (JPG or PNG) are allowed"]
        );
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(form("Heat", "desc", "HEAT.PNG").validate(&rules()).is_ok());
    }

    #[test]
    fn missing_poster_is_required() {
        let mut f = form("Heat", "desc", "heat.png");
        f.poster = None;
        let errors = f.validate(&rules()).unwrap_err();
        assert_eq!(errors.get("poster").unwrap(), ["A movie poster is required"]);
    }

    #[test]
    fn unusable_filename_is_rejected() {
        let errors = form("Heat", "desc", "../../").validate(&rules()).unwrap_err();
        assert_eq!(errors.get("poster").unwrap(), ["The poster filename is not valid"]);
    }

    #[test]
    fn errors_follow_field_order() {
        let errors = MovieForm::default().validate(&rules()).unwrap_err();
        assert_eq!(
            errors.messages(),
            vec![
                "Error in the Movie Title field - The title is required".to_string(),
                "Error in the Movie Description field - A brief description is required"
                    .to_string(),
                "Error in the Movie Poster field - A movie poster is required".to_string(),
            ]
        );
    }
}
