//! Print what the configured vector store holds.
//!
//! Lists every collection with its document count, the first document, its
//! embedding's dimension and value range, and all ids. Reads the same
//! environment as the API server.

use core_config::{Environment, FromEnv, env_or_default};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_documents::{
    DEFAULT_COLLECTION_NAME, DocumentService, EmbeddingConfig, InspectionReport, StoreConfig,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();
    init_tracing(&Environment::from_env());

    let store = StoreConfig::from_env()?.connect()?;
    let embedding = EmbeddingConfig::from_env()?.build()?;
    let collection = env_or_default("COLLECTION_NAME", DEFAULT_COLLECTION_NAME);
    let service = DocumentService::new(store, collection, embedding);

    service
        .heartbeat()
        .await
        .map_err(|e| eyre::eyre!("Vector store is not reachable: {}", e))?;

    let reports = service.inspect_all().await?;
    println!("Collections: {}", reports.len());
    for report in &reports {
        print_report(report);
    }

    Ok(())
}

fn print_report(report: &InspectionReport) {
    println!();
    println!("Collection: {} ({})", report.collection, report.metric.as_str());
    println!("Document count: {}", report.count);

    if let Some(first) = report.documents.first() {
        println!("First document:");
        println!("  id: {}", first.id);
        println!("  text: {}", first.document.as_deref().unwrap_or("<none>"));
        println!(
            "  metadata: {}",
            serde_json::to_string(&first.metadata).unwrap_or_default()
        );
        match &first.embedding {
            Some(embedding) => {
                println!("  embedding dimension: {}", embedding.dimension);
                println!("  embedding preview: {:?}", embedding.preview);
                println!("  value range: [{:.4}, {:.4}]", embedding.min, embedding.max);
            }
            None => println!("  embedding: <missing>"),
        }
    }

    println!("All ids: {:?}", report.ids);
}
