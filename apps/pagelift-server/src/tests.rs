//! Tests for the pagelift server API
//!
//! Handlers are exercised directly with constructed extractors; documents
//! are built in-memory with lopdf. Property tests fuzz the upload body and
//! the text placement.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, response::IntoResponse};

use lopdf::{dictionary, Document, Object, Stream};

use pagelift_decode::LopdfDecoder;

use crate::api::{handle_health, handle_parse_pdf};
use crate::error::ServerError;
use crate::AppState;

fn test_state() -> AppState {
    AppState {
        decoder: Arc::new(LopdfDecoder::default()),
    }
}

/// One-page 612×792 document showing `text` at (x, y) in `size` pt.
fn pdf_with_text(text: &str, x: f64, y: f64, size: f64) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    // Fixed-point formatting: PDF numbers do not take exponent notation.
    let content = format!("BT /F1 {size:.2} Tf {x:.2} {y:.2} Td ({text}) Tj ET");
    let content_id = doc.add_object(Object::Stream(Stream::new(
        lopdf::Dictionary::new(),
        content.into_bytes(),
    )));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => dictionary! {
            "Font" => dictionary! {
                "F1" => Object::Reference(font_id),
            },
        },
    });
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
    });
    if let Ok(page) = doc.get_object_mut(page_id) {
        if let Ok(dict) = page.as_dict_mut() {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("test document serializes");
    buffer
}

mod handler_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_health_reports_service_name() {
        let response = handle_health().await;
        assert_eq!(response.0.status, "healthy");
        assert_eq!(response.0.service, "pagelift-server");
    }

    #[tokio::test]
    async fn test_parse_returns_screen_space_geometry() {
        let pdf = pdf_with_text("Hello", 50.0, 700.0, 12.0);
        let response = handle_parse_pdf(State(test_state()), Bytes::from(pdf))
            .await
            .expect("parse succeeds");

        assert_eq!(response.0.width, 612.0 * 1.5);
        assert_eq!(response.0.height, 792.0 * 1.5);
        assert_eq!(response.0.texts.len(), 1);

        let item = &response.0.texts[0];
        assert_eq!(item.text, "Hello");
        assert_eq!(item.color, "#000000");
        // 12pt at scale 1.5.
        assert!((item.font_size - 18.0).abs() < 1e-9);
        assert!((item.x - 75.0).abs() < 1e-9);
        // Baseline at doc y=700 flips to (792-700)*1.5, minus the font size.
        assert!((item.y - ((792.0 - 700.0) * 1.5 - 18.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_parse_filters_blank_runs() {
        let pdf = pdf_with_text("   ", 50.0, 700.0, 12.0);
        let response = handle_parse_pdf(State(test_state()), Bytes::from(pdf))
            .await
            .expect("parse succeeds");
        assert!(response.0.texts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let result = handle_parse_pdf(State(test_state()), Bytes::new()).await;
        assert!(matches!(result, Err(ServerError::NoFile)));
    }

    #[tokio::test]
    async fn test_garbage_body_yields_bad_request() {
        let result = handle_parse_pdf(State(test_state()), Bytes::from_static(b"not a pdf")).await;
        let err = match result {
            Err(err) => err,
            Ok(_) => panic!("garbage bytes must not parse"),
        };
        let response = err.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: arbitrary garbage never panics the handler and never
        /// returns success
        #[test]
        fn garbage_uploads_fail_cleanly(bytes in prop::collection::vec(any::<u8>(), 1..512)) {
            // Skip inputs that accidentally start like a real document.
            prop_assume!(!bytes.starts_with(b"%PDF"));

            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime builds");
            let result = runtime.block_on(handle_parse_pdf(
                State(test_state()),
                Bytes::from(bytes),
            ));
            prop_assert!(result.is_err());
        }

        /// Property: a document with one visible run always yields exactly
        /// one text item whose font size is scale-corrected
        #[test]
        fn single_run_roundtrips(
            x in 0.0f64..500.0,
            y in 100.0f64..700.0,
            size in 6.0f64..48.0,
        ) {
            // The fixture formats to two decimals and content streams carry
            // single-precision reals; compare against the rounded values
            // with a matching tolerance.
            let x = (x * 100.0).round() / 100.0;
            let y = (y * 100.0).round() / 100.0;
            let size = (size * 100.0).round() / 100.0;

            let pdf = pdf_with_text("Sample", x, y, size);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime builds");
            let response = runtime
                .block_on(handle_parse_pdf(State(test_state()), Bytes::from(pdf)))
                .expect("parse succeeds");

            prop_assert_eq!(response.0.texts.len(), 1);
            let item = &response.0.texts[0];
            prop_assert!((item.font_size - size * 1.5).abs() < 1e-3);
            prop_assert!((item.x - x * 1.5).abs() < 1e-3);
        }
    }
}
