// 集成测试公共模块
//
// 脚本化传输实现：按 URL 片段匹配预置响应，并记录全部请求，
// 供断言网络行为（调用次数、命中的端点）使用。

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;

use word_translator::core::transport::{Transport, TransportResponse};
use word_translator::error::{TranslateError, TranslateResult};

static TRACING: Once = Once::new();

/// 初始化测试日志输出（RUST_LOG 控制级别）
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// 一条脚本规则：URL 包含 `fragment` 时返回对应结果
pub struct Rule {
    pub fragment: String,
    pub outcome: TranslateResult<TransportResponse>,
}

/// 脚本化传输
///
/// 规则按注册顺序匹配，首条命中生效；没有规则命中时返回传输失败。
/// `calls` 记录每次请求的完整 URL。
pub struct MockTransport {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// URL 含指定片段时返回 200 与给定响应体
    pub fn respond(self: &Arc<Self>, fragment: &str, body: &str) -> Arc<Self> {
        self.push(fragment, Ok(TransportResponse::new(200, body)));
        Arc::clone(self)
    }

    /// URL 含指定片段时返回给定状态码
    pub fn respond_status(self: &Arc<Self>, fragment: &str, status: u16) -> Arc<Self> {
        self.push(fragment, Ok(TransportResponse::new(status, "")));
        Arc::clone(self)
    }

    /// URL 含指定片段时返回传输层错误
    pub fn fail(self: &Arc<Self>, fragment: &str) -> Arc<Self> {
        self.push(
            fragment,
            Err(TranslateError::TransportFailure("scripted failure".into())),
        );
        Arc::clone(self)
    }

    fn push(&self, fragment: &str, outcome: TranslateResult<TransportResponse>) {
        self.rules.lock().unwrap().push(Rule {
            fragment: fragment.to_string(),
            outcome,
        });
    }

    /// 记录到的请求总数
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// URL 含指定片段的请求数
    pub fn calls_matching(&self, fragment: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, url: &str) -> TranslateResult<TransportResponse> {
        self.calls.lock().unwrap().push(url.to_string());

        let rules = self.rules.lock().unwrap();
        for rule in rules.iter() {
            if url.contains(&rule.fragment) {
                return match &rule.outcome {
                    Ok(response) => Ok(response.clone()),
                    Err(e) => Err(e.clone()),
                };
            }
        }
        Err(TranslateError::TransportFailure(format!(
            "no scripted response for {}",
            url
        )))
    }
}

/// google-gtx 形状的成功响应体
pub fn gtx_body(translation: &str) -> String {
    format!(r#"[[["{}","ignored",null]],null,"en"]"#, translation)
}

/// dictionaryapi 形状的成功响应体
pub fn dictionary_body(definition: &str, phonetic: &str) -> String {
    format!(
        r#"[{{"word":"w","phonetic":"{}","phonetics":[{{"text":"{}"}}],"meanings":[{{"partOfSpeech":"noun","definitions":[{{"definition":"{}"}}]}}]}}]"#,
        phonetic, phonetic, definition
    )
}
