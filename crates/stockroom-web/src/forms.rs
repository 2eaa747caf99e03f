//! Form submission extraction.
//!
//! Create and update posts arrive either as `multipart/form-data` (with an
//! optional image in the `item-img` field) or as URL-encoded bodies.

use async_trait::async_trait;
use axum::Form;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use stockroom_inventory::{CategoryForm, ItemForm, UploadedFile};

use crate::error::WebError;
use crate::views::IMAGE_FIELD;

/// Text fields and optional image from one form post.
#[derive(Debug, Clone, Default)]
pub struct SubmittedForm {
    fields: Vec<(String, String)>,
    image: Option<UploadedFile>,
}

impl SubmittedForm {
    /// Builds a submission from already-decoded parts.
    #[must_use]
    pub fn new(fields: Vec<(String, String)>, image: Option<UploadedFile>) -> Self {
        Self { fields, image }
    }

    /// First value submitted for `name`, or empty.
    #[must_use]
    pub fn value(&self, name: &str) -> String {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    /// Every value submitted for `name`, in order.
    #[must_use]
    pub fn values(&self, name: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// The uploaded image, if the image part carried any bytes.
    #[must_use]
    pub fn image(&self) -> Option<&UploadedFile> {
        self.image.as_ref()
    }

    /// Category form view of the submission.
    #[must_use]
    pub fn category_form(&self) -> CategoryForm {
        CategoryForm {
            name: self.value("name"),
            description: self.value("description"),
        }
    }

    /// Item form view of the submission.
    ///
    /// `category` may repeat; every value is kept.
    #[must_use]
    pub fn item_form(&self) -> ItemForm {
        ItemForm {
            name: self.value("name"),
            description: self.value("description"),
            price: self.value("price"),
            quantity_in_stock: self.value("stock"),
            categories: self.values("category"),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for SubmittedForm
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
                WebError::with_status(rejection.status(), rejection.body_text())
            })?;
            read_multipart(multipart).await
        } else {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| {
                    WebError::with_status(rejection.status(), rejection.body_text())
                })?;
            Ok(Self::new(fields, None))
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<SubmittedForm, WebError> {
    let mut fields = Vec::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| WebError::with_status(err.status(), err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|err| WebError::with_status(err.status(), err.body_text()))?;

            // Browsers send an empty part when no file was chosen. A part with
            // a body but no filename still goes through the type filter.
            if !data.is_empty() {
                image = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| WebError::with_status(err.status(), err.body_text()))?;
            fields.push((name, value));
        }
    }

    Ok(SubmittedForm::new(fields, image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    const BOUNDARY: &str = "stockroom-test-boundary";

    fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((file_name, content_type)) => {
                    let filename = if file_name.is_empty() {
                        String::new()
                    } else {
                        format!("; filename=\"{file_name}\"")
                    };
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"{filename}\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                }
                None => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                }
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn reads_urlencoded_with_repeated_fields() {
        let request = axum::http::Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Hammer&category=a&category=b&stock=5"))
            .unwrap();
        let form = SubmittedForm::from_request(request, &()).await.unwrap();
        let item = form.item_form();
        assert_eq!(item.name, "Hammer");
        assert_eq!(item.quantity_in_stock, "5");
        assert_eq!(item.categories, vec!["a", "b"]);
        assert!(item.price.is_empty());
        assert!(form.image().is_none());
    }

    #[tokio::test]
    async fn reads_multipart_image() {
        let body = multipart_body(&[
            ("name", None, &b"Hammer"[..]),
            (IMAGE_FIELD, Some(("hammer.png", "image/png")), &b"png-bytes"[..]),
        ]);
        let request = axum::http::Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let form = SubmittedForm::from_request(request, &()).await.unwrap();
        assert_eq!(form.value("name"), "Hammer");
        let image = form.image().unwrap();
        assert_eq!(image.file_name, "hammer.png");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.data.as_ref(), b"png-bytes");
    }

    #[tokio::test]
    async fn empty_file_part_is_no_image() {
        let body = multipart_body(&[
            ("name", None, &b"Hammer"[..]),
            (IMAGE_FIELD, Some(("", "application/octet-stream")), &b""[..]),
        ]);
        let request = axum::http::Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let form = SubmittedForm::from_request(request, &()).await.unwrap();
        assert!(form.image().is_none());
    }

    #[tokio::test]
    async fn nameless_image_part_with_body_is_kept() {
        let body = multipart_body(&[
            ("name", None, &b"Hammer"[..]),
            (IMAGE_FIELD, Some(("", "image/gif")), &b"GIF89a"[..]),
        ]);
        let request = axum::http::Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let form = SubmittedForm::from_request(request, &()).await.unwrap();
        let image = form.image().unwrap();
        assert!(image.file_name.is_empty());
        assert_eq!(image.content_type, "image/gif");
    }
}
