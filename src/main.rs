#[tokio::main]
async fn main() {
    if let Err(e) = symptom_advisor_lib::run().await {
        eprintln!("symptom-advisor: {e}");
        std::process::exit(1);
    }
}
