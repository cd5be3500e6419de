//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};
use pdfsum::{
    config::Config,
    processing::SummaryService,
    storage::{DocumentStore, ObjectDocumentStore},
    summarization::ExtractiveSummarizer,
};

pub const REPORT_TEXT: &str = "Solar panels convert sunlight. Tax rules changed yesterday. \
Solar panels and wind turbines supply clean energy. Wind turbines spin offshore. \
Clean energy demand grows.";

/// Build a PDF with one page per entry; `None` produces a page without text.
pub fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|page| {
            let operations = page
                .map(|text| {
                    vec![
                        Operation::new("BT", vec![]),
                        Operation::new("Tf", vec!["F1".into(), 11.into()]),
                        Operation::new("Td", vec![50.into(), 700.into()]),
                        Operation::new("Tj", vec![Object::string_literal(text)]),
                        Operation::new("ET", vec![]),
                    ]
                })
                .unwrap_or_default();
            let encoded = Content { operations }.encode().expect("encode content");
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })
            .into()
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize pdf");
    buffer
}

/// Extractive service with an in-memory store and no retry delays.
pub fn extractive_service() -> SummaryService {
    let config = Config {
        summary_sentences: 2,
        retry_base_delay_ms: 0,
        retry_min_delay_ms: 0,
        retry_max_delay_ms: 0,
        ..Config::default()
    };
    let store: Arc<dyn DocumentStore> = Arc::new(ObjectDocumentStore::in_memory());
    SummaryService::new(
        Arc::new(config),
        Arc::new(ExtractiveSummarizer::default()),
        Some(store),
    )
}
