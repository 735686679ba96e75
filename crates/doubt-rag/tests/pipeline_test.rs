//! End-to-end build and retrieve over in-process providers

mod common;

use std::sync::Arc;

use common::{RecordingLlm, VocabEmbedder};
use doubt_rag::generation::AnswerGenerator;
use doubt_rag::ingestion::{FileReader, IngestPipeline, TextChunker};
use doubt_rag::retrieval::Retriever;
use doubt_rag::{BotMode, Document, Error};

fn pipeline() -> IngestPipeline {
    IngestPipeline::new(
        FileReader::new(),
        TextChunker::default(),
        Arc::new(VocabEmbedder),
    )
}

#[tokio::test]
async fn mammals_query_ranks_animal_documents_first() {
    let docs = vec![
        Document::new("cats.txt", "cats are mammals"),
        Document::new("dogs.txt", "dogs are mammals"),
        Document::new("stocks.txt", "the stock market fell"),
    ];
    let outcome = pipeline().build_index(&docs).await.unwrap();
    assert_eq!(outcome.index.len(), 3);

    let results = Retriever::new(Arc::new(VocabEmbedder))
        .retrieve(&outcome.index, "mammals", 3)
        .await
        .unwrap();

    let order: Vec<&str> = results.iter().map(|r| r.chunk.source.as_str()).collect();
    assert_eq!(order, vec!["cats.txt", "dogs.txt", "stocks.txt"]);
    assert!(results[1].similarity > results[2].similarity);
}

#[tokio::test]
async fn unrecognised_binary_is_skipped_while_batch_completes() {
    let docs = vec![
        Document::new("notes.md", "plants need light"),
        Document::new("blob.xyz", vec![0x00, 0x9f, 0x92, 0x96, 0xff])
            .with_mime("application/octet-stream"),
        Document::new("bio.txt", "osmosis moves water"),
    ];
    let outcome = pipeline().build_index(&docs).await.unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].filename, "blob.xyz");
    assert!(outcome.failures[0].error.contains("Unsupported file type"));

    let indexed: Vec<&str> = outcome.documents.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(indexed, vec!["notes.md", "bio.txt"]);
    assert_eq!(outcome.index.document_ids(), vec![docs[0].id, docs[2].id]);
}

#[tokio::test]
async fn embeddings_are_identical_across_builds() {
    let docs = vec![Document::new("bio.txt", "osmosis moves water into plants")];
    let first = pipeline().build_index(&docs).await.unwrap();
    let second = pipeline().build_index(&docs).await.unwrap();

    assert_eq!(first.index.entries()[0].vector, second.index.entries()[0].vector);
    assert_eq!(first.index.entries()[0].chunk.content, second.index.entries()[0].chunk.content);
}

#[tokio::test]
async fn long_document_chunks_overlap_and_cover_text() {
    let text = "plants need light. ".repeat(200);
    let docs = vec![Document::new("long.txt", text.clone())];
    let outcome = pipeline().build_index(&docs).await.unwrap();
    assert!(outcome.index.len() > 1);

    let overlap = TextChunker::default().overlap();
    let mut rebuilt = String::new();
    for (i, entry) in outcome.index.entries().iter().enumerate() {
        let content = &entry.chunk.content;
        if i == 0 {
            rebuilt.push_str(content);
        } else {
            rebuilt.extend(content.chars().skip(overlap));
        }
    }
    assert_eq!(rebuilt, text);
}

#[tokio::test]
async fn grounded_answer_cites_retrieved_chunks() {
    let docs = vec![
        Document::new("cats.txt", "cats are mammals"),
        Document::new("stocks.txt", "the stock market fell"),
    ];
    let outcome = pipeline().build_index(&docs).await.unwrap();
    let context = Retriever::new(Arc::new(VocabEmbedder))
        .retrieve(&outcome.index, "are cats mammals?", 1)
        .await
        .unwrap();

    let llm = RecordingLlm::new("Yes [1].");
    let answer = AnswerGenerator::new(llm.clone())
        .answer("are cats mammals?", BotMode::Normal, Some(context.as_slice()))
        .await
        .unwrap();

    assert_eq!(answer.text, "Yes [1].");
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].filename, "cats.txt");
    assert!(llm.prompts()[0].contains("[1] cats.txt (chunk 1)\ncats are mammals"));
}

#[tokio::test]
async fn index_of_nothing_answers_nothing() {
    let outcome = pipeline().build_index(&[]).await.unwrap();
    assert!(outcome.index.is_empty());

    let results = Retriever::new(Arc::new(VocabEmbedder))
        .retrieve(&outcome.index, "mammals", 4)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn chunker_rejects_overlap_not_smaller_than_size() {
    assert!(matches!(TextChunker::new(100, 100), Err(Error::Config(_))));
}
