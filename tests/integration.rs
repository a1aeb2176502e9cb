use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn aula_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("aula");
    path
}

/// Single-page PDF showing `phrase`, with correct xref offsets so
/// pdf-extract can parse it.
fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn setup_test_env() -> (TempDir, PathBuf) {
    setup_test_env_with_bind("127.0.0.1:7331")
}

fn setup_test_env_with_bind(bind: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("procesos.pdf"),
        minimal_pdf("El planificador asigna la CPU a cada proceso listo"),
    )
    .unwrap();
    fs::write(
        files_dir.join("memoria.pdf"),
        minimal_pdf("La memoria virtual usa paginacion bajo demanda"),
    )
    .unwrap();
    fs::write(files_dir.join("roto.pdf"), b"this is not a pdf").unwrap();

    let config_content = format!(
        r#"[data]
dir = "{}/data"

[chunking]
target_size = 1000
overlap_budget = 200

[retrieval]
top_k = 5

[llm]
api_key_env = "AULA_TEST_MISSING_API_KEY"

[server]
bind = "{}"
"#,
        root.display(),
        bind
    );

    let config_path = config_dir.join("aula.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_aula(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = aula_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("AULA_TEST_MISSING_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run aula binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn file(tmp: &TempDir, name: &str) -> String {
    tmp.path().join("files").join(name).to_string_lossy().to_string()
}

#[test]
fn test_add_and_list() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_aula(
        &config_path,
        &["add", &file(&tmp, "procesos.pdf"), &file(&tmp, "memoria.pdf")],
    );
    assert!(success, "add failed: {}", stderr);
    assert!(stdout.contains("✓ procesos.pdf: 1 fragments"));
    assert!(stdout.contains("✓ memoria.pdf: 1 fragments"));

    assert!(tmp.path().join("data/vectorstore/documents.json").exists());
    assert!(tmp.path().join("data/uploaded_pdfs/procesos.pdf").exists());

    let (stdout, _, success) = run_aula(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("procesos.pdf"));
    assert!(stdout.contains("memoria.pdf"));
}

#[test]
fn test_add_continues_past_failures() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_aula(
        &config_path,
        &["add", &file(&tmp, "roto.pdf"), &file(&tmp, "memoria.pdf")],
    );
    assert!(!success, "a failed file should fail the command");
    assert!(stderr.contains("✗ roto.pdf"));
    assert!(stderr.contains("1 of 2 files failed"));
    assert!(stdout.contains("✓ memoria.pdf"));

    let (stdout, _, _) = run_aula(&config_path, &["list"]);
    assert!(stdout.contains("memoria.pdf"));
    assert!(!stdout.contains("roto.pdf"));
}

#[test]
fn test_search_ranks_relevant_document() {
    let (tmp, config_path) = setup_test_env();
    run_aula(
        &config_path,
        &["add", &file(&tmp, "procesos.pdf"), &file(&tmp, "memoria.pdf")],
    );

    let (stdout, _, success) =
        run_aula(&config_path, &["search", "memoria virtual paginacion", "--json"]);
    assert!(success);
    let results: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["document"], "memoria.pdf");
    assert_eq!(results[0]["id"], "memoria.pdf_0");
    let score = results[0]["score"].as_f64().unwrap();
    assert!(score > 0.0 && score <= 1.0);
}

#[test]
fn test_search_deterministic() {
    let (tmp, config_path) = setup_test_env();
    run_aula(
        &config_path,
        &["add", &file(&tmp, "procesos.pdf"), &file(&tmp, "memoria.pdf")],
    );

    let (first, _, _) = run_aula(&config_path, &["search", "proceso memoria"]);
    let (second, _, _) = run_aula(&config_path, &["search", "proceso memoria"]);
    assert_eq!(first, second);
}

#[test]
fn test_search_no_results() {
    let (tmp, config_path) = setup_test_env();
    run_aula(&config_path, &["add", &file(&tmp, "procesos.pdf")]);

    let (stdout, _, success) = run_aula(&config_path, &["search", "astronomia galactica"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_remove_and_clear() {
    let (tmp, config_path) = setup_test_env();
    run_aula(
        &config_path,
        &["add", &file(&tmp, "procesos.pdf"), &file(&tmp, "memoria.pdf")],
    );

    let (stdout, _, success) = run_aula(&config_path, &["remove", "procesos.pdf"]);
    assert!(success);
    assert!(stdout.contains("Removed procesos.pdf (1 fragments)."));
    assert!(!tmp.path().join("data/uploaded_pdfs/procesos.pdf").exists());

    let (_, stderr, success) = run_aula(&config_path, &["remove", "procesos.pdf"]);
    assert!(!success);
    assert!(stderr.contains("document not indexed"));

    let (stdout, _, success) = run_aula(&config_path, &["clear"]);
    assert!(success);
    assert!(stdout.contains("Index cleared."));
    assert!(!tmp.path().join("data/vectorstore/documents.json").exists());

    let (stdout, _, _) = run_aula(&config_path, &["list"]);
    assert!(stdout.contains("No documents indexed."));
}

#[test]
fn test_ask_greeting_needs_no_credentials() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_aula(&config_path, &["ask", "¡Hola!"]);
    assert!(success);
    assert!(stdout.contains("¿En qué tema del material educativo te gustaría que te ayude?"));
}

#[test]
fn test_ask_without_credentials_keeps_sources() {
    let (tmp, config_path) = setup_test_env();
    run_aula(&config_path, &["add", &file(&tmp, "procesos.pdf")]);

    let (stdout, stderr, success) =
        run_aula(&config_path, &["ask", "¿Qué hace el planificador?", "--json"]);
    assert!(success, "ask failed: {}", stderr);
    let answer: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let text = answer["answer"].as_str().unwrap();
    assert!(text.starts_with("Error al generar respuesta"), "got {}", text);
    assert!(text.contains("AULA_TEST_MISSING_API_KEY"));
    assert_eq!(answer["sources"][0]["document"], "procesos.pdf");
}

#[test]
fn test_ask_prints_sources() {
    let (tmp, config_path) = setup_test_env();
    run_aula(&config_path, &["add", &file(&tmp, "procesos.pdf")]);

    let (stdout, _, success) = run_aula(&config_path, &["ask", "planificador de CPU"]);
    assert!(success);
    assert!(stdout.contains("📄 procesos.pdf - relevance: "));
}

#[test]
fn test_stats() {
    let (tmp, config_path) = setup_test_env();
    run_aula(&config_path, &["add", &file(&tmp, "memoria.pdf")]);

    let (stdout, _, success) = run_aula(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Documents:   1"));
    assert!(stdout.contains("Fragments:   1"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let binary = aula_binary();
    let output = Command::new(&binary)
        .current_dir(tmp.path())
        .args(["--config", "absent.toml", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No documents indexed."));
}

#[test]
fn test_invalid_config_errors() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[retrieval]\ntop_k = 0\n").unwrap();

    let (_, stderr, success) = run_aula(&config_path, &["list"]);
    assert!(!success);
    assert!(stderr.contains("top_k"));
}

#[test]
fn test_serve_health_and_search() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let bind = format!("127.0.0.1:{}", port);
    let (tmp, config_path) = setup_test_env_with_bind(&bind);
    run_aula(&config_path, &["add", &file(&tmp, "memoria.pdf")]);

    let _server = ServerGuard(
        Command::new(aula_binary())
            .arg("--config")
            .arg(config_path.to_str().unwrap())
            .arg("serve")
            .spawn()
            .unwrap(),
    );

    let client = reqwest::blocking::Client::new();
    let base = format!("http://{}", bind);
    let mut healthy = false;
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{}/health", base)).send() {
            if resp.status().is_success() {
                healthy = true;
                break;
            }
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    assert!(healthy, "server did not become healthy");

    let body: serde_json::Value = client
        .post(format!("{}/search", base))
        .json(&serde_json::json!({ "query": "paginacion", "limit": 3 }))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(body["results"][0]["document"], "memoria.pdf");
}

/// Kills the spawned server when the test ends, pass or fail.
struct ServerGuard(std::process::Child);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

#[test]
fn test_remove_unknown_keeps_stray_copy() {
    let (tmp, config_path) = setup_test_env();
    let uploads = tmp.path().join("data/uploaded_pdfs");
    fs::create_dir_all(&uploads).unwrap();
    fs::write(uploads.join("ghost.pdf"), b"stray").unwrap();

    let (_, stderr, success) = run_aula(&config_path, &["remove", "ghost.pdf"]);
    assert!(!success);
    assert!(stderr.contains("document not indexed"));
    assert!(uploads.join("ghost.pdf").exists());
}
