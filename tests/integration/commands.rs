use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::{self, CHANNEL};
use crate::common::mocks::{MockSink, Recorder};
use crate::common::{config, context, run_command};

/// Runs `text` against a recorder and returns the stripped reply lines.
async fn replies(vars: &[(&str, &str)], text: &str) -> Vec<String> {
    crate::test_utils::init();
    let recorder = Arc::new(Recorder::default());
    let ctx = context(config(vars), recorder.clone());
    run_command(&ctx, text).await;
    recorder.texts()
}

async fn mount_quote(server: &MockServer, symbol: &str, price: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v10/finance/quoteSummary/{symbol}")))
        .and(query_param("modules", "price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::quote_summary(price)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_stock_joins_quotes_on_one_line() {
    let server = MockServer::start().await;
    mount_quote(&server, "AAPL", fixtures::apple_price()).await;
    mount_quote(&server, "MSFT", fixtures::microsoft_price()).await;

    let lines = replies(&[("YAHOO_BASE_URL", server.uri().as_str())], "!stock AAPL MSFT").await;

    assert_eq!(
        lines,
        vec![
            "alice: AAPL : Apple Inc. $189.84 ▲ 1.23 (0.65%) High: 190.32 Low: 188.19 Open | \
             MSFT : Microsoft Corporation $330 ▲ 4.5 (1.38%) High: 331.2 Low: 326.1 Open"
        ]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_crypto_appends_fiat() {
    let server = MockServer::start().await;
    mount_quote(&server, "BTC-USD", fixtures::bitcoin_price()).await;

    let lines = replies(&[("YAHOO_BASE_URL", server.uri().as_str())], "!crypto BTC").await;

    assert_eq!(
        lines,
        vec!["alice: BTC-USD : Bitcoin USD $29,345.1 ▼ -500 (-1.68%) High: 29,900 Low: 29,100 Open"]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_crypto_uses_configured_fiat() {
    let server = MockServer::start().await;
    mount_quote(&server, "ETH-EUR", fixtures::bitcoin_price()).await;

    let lines = replies(
        &[
            ("YAHOO_BASE_URL", server.uri().as_str()),
            ("STOCKS_CRYPTO_FIAT", "eur"),
        ],
        "!crypto ETH",
    )
    .await;

    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("alice: ETH-EUR : "), "{}", lines[0]);
    server.verify().await;
}

#[tokio::test]
async fn test_sindex_quotes_every_us_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v10/finance/quoteSummary/[^/]+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::quote_summary(fixtures::index_price())),
        )
        .expect(4)
        .mount(&server)
        .await;

    let lines = replies(&[("YAHOO_BASE_URL", server.uri().as_str())], "!sindex").await;

    let quote = "Index 33,000.5 ▼ -99.75 (-0.3%) High: 33,200 Low: 32,900";
    assert_eq!(
        lines,
        vec![format!(
            "alice: ^DJI : {quote} | ^GSPC : {quote} | ^IXIC : {quote} | ^RUT : {quote}"
        )]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_findex_quotes_world_indexes_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v10/finance/quoteSummary/[^/]+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::quote_summary(fixtures::index_price())),
        )
        .expect(4)
        .mount(&server)
        .await;

    let lines = replies(&[("YAHOO_BASE_URL", server.uri().as_str())], "!findex").await;

    let symbols: Vec<&str> = lines[0]
        .trim_start_matches("alice: ")
        .split(" | ")
        .filter_map(|quote| quote.split(' ').next())
        .collect();
    assert_eq!(symbols, vec!["^GDAXI", "^FCHI", "^FTSE", "^N225"]);
    server.verify().await;
}

#[tokio::test]
async fn test_unknown_symbol_reports_upstream_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/NOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(fixtures::quote_not_found("NOPE")))
        .mount(&server)
        .await;

    let lines = replies(&[("YAHOO_BASE_URL", server.uri().as_str())], "!stock NOPE").await;

    assert_eq!(
        lines,
        vec!["alice: Error: NOPE: Quote not found for ticker symbol: NOPE"]
    );
}

#[tokio::test]
async fn test_empty_result_is_generic_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v10/finance/quoteSummary/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quoteSummary": {"result": [], "error": null}
        })))
        .mount(&server)
        .await;

    let lines = replies(&[("YAHOO_BASE_URL", server.uri().as_str())], "!stock AAPL").await;

    assert_eq!(lines, vec!["alice: Error: AAPL: An error occurred."]);
}

#[tokio::test]
async fn test_too_many_symbols_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let lines = replies(
        &[("YAHOO_BASE_URL", server.uri().as_str()), ("STOCKS_MAX_SYMBOLS", "2")],
        "!stock AAPL MSFT GOOG",
    )
    .await;

    assert_eq!(
        lines,
        vec!["alice: Error: Too many symbols. Maximum count 2. Your count: 3"]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_invalid_symbol_is_rejected() {
    let lines = replies(&[], "!stock $$$").await;

    assert_eq!(lines, vec!["alice: Error: '$$$' is not a valid symbol."]);
}

#[tokio::test]
async fn test_stock_without_symbols_shows_usage() {
    let lines = replies(&[], "!stock").await;

    assert_eq!(lines, vec!["alice: Error: Usage: stock <symbol> [<symbol> ...]"]);
}

#[tokio::test]
async fn test_forex_rate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("function", "CURRENCY_EXCHANGE_RATE"))
        .and(query_param("from_currency", "USD"))
        .and(query_param("to_currency", "EUR"))
        .and(query_param("apikey", "av-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::usd_eur_rate()))
        .expect(1)
        .mount(&server)
        .await;

    let lines = replies(
        &[
            ("ALPHAVANTAGE_BASE_URL", server.uri().as_str()),
            ("ALPHAVANTAGE_API_KEY", "av-key"),
        ],
        "!forex USD EUR",
    )
    .await;

    assert_eq!(
        lines,
        vec!["alice: USD:United States Dollar to EUR:Euro 0.9215 (as of 2023-05-01 12:34 UTC)"]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_forex_without_key() {
    let lines = replies(&[], "!forex USD EUR").await;

    assert_eq!(
        lines,
        vec!["alice: Error: Missing API key, ask the admin to get one and set ALPHAVANTAGE_API_KEY"]
    );
}

#[tokio::test]
async fn test_forex_needs_two_currencies() {
    let lines = replies(&[("ALPHAVANTAGE_API_KEY", "av-key")], "!forex USD").await;

    assert_eq!(lines, vec!["alice: Error: Usage: forex <symbol> <symbol>"]);
}

#[tokio::test]
async fn test_chatgpt_answer_is_chunked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "messages": [{"role": "user", "content": "what is rust?"}],
            "max_tokens": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::chat_completion(
            "\n\nRust is a systems programming language focused on safety, speed and concurrency.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let lines = replies(
        &[
            ("OPENAI_BASE_URL", server.uri().as_str()),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MAX_TOKENS", "100"),
            ("CHUNK_LIMIT", "40"),
        ],
        "!chatgpt what is rust?",
    )
    .await;

    assert_eq!(
        lines,
        vec![
            "alice: Rust is a systems programming language",
            "focused on safety, speed and",
            "concurrency.",
        ]
    );
    server.verify().await;
}

#[tokio::test]
async fn test_gpt3_uses_completion_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/completions"))
        .and(body_partial_json(json!({
            "model": "text-davinci-003",
            "prompt": "Say hello"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(fixtures::text_completion("\n\nHello there.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let lines = replies(
        &[
            ("OPENAI_BASE_URL", server.uri().as_str()),
            ("OPENAI_API_KEY", "sk-test"),
        ],
        "!gpt3 Say hello",
    )
    .await;

    assert_eq!(lines, vec!["alice: Hello there."]);
    server.verify().await;
}

#[tokio::test]
async fn test_openai_refusal_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "requests"}
        })))
        .mount(&server)
        .await;

    let lines = replies(
        &[
            ("OPENAI_BASE_URL", server.uri().as_str()),
            ("OPENAI_API_KEY", "sk-test"),
        ],
        "!chatgpt hi",
    )
    .await;

    assert_eq!(
        lines,
        vec!["alice: Error: Refused to complete request: Rate limit reached"]
    );
}

#[tokio::test]
async fn test_chatgpt_without_key() {
    let lines = replies(&[], "!chatgpt hi").await;

    assert_eq!(
        lines,
        vec!["alice: Error: Missing API key, ask the admin to get one and set OPENAI_API_KEY"]
    );
}

#[tokio::test]
async fn test_help_lists_commands() {
    let lines = replies(&[], "!help").await;

    assert_eq!(
        lines,
        vec!["alice: chatgpt, gpt3, stock, crypto, forex, sindex, findex, help"]
    );
}

#[tokio::test]
async fn test_help_for_unknown_command() {
    let lines = replies(&[], "!help nope").await;

    assert_eq!(lines, vec!["alice: There is no command called 'nope'."]);
}

#[tokio::test]
async fn test_unknown_command_sends_nothing() {
    crate::test_utils::init();
    let mut sink = MockSink::new();
    sink.expect_send().never();

    let ctx = context(config(&[]), Arc::new(sink));
    run_command(&ctx, "!weather Paris").await;
}

#[tokio::test]
async fn test_reply_goes_to_the_invoking_channel() {
    crate::test_utils::init();
    let mut sink = MockSink::new();
    sink.expect_send()
        .withf(|line| line.target == CHANNEL && line.text.starts_with("alice: ("))
        .times(1)
        .returning(|_| Ok(()));

    let ctx = context(config(&[]), Arc::new(sink));
    run_command(&ctx, "!help stock").await;
}
