//! 翻译模块
//!
//! - `TranslationBackend`：翻译后端抽象（文本 -> 译文），对多段输入的段数保持不作任何信任
//! - `HttpTranslationBackend`：基于HTTP JSON接口的后端实现
//! - `BatchTranslator`：把有序文本分批拼接翻译，校验段数与长度，不合格的批次逐条回退

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::MirrorConfig;
use crate::error::Result;
use crate::mirror_error;

/// 翻译后端
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// 翻译一段文本
    async fn translate(&self, text: &str) -> Result<String>;
}

#[async_trait]
impl<T: TranslationBackend + ?Sized> TranslationBackend for std::sync::Arc<T> {
    async fn translate(&self, text: &str) -> Result<String> {
        (**self).translate(text).await
    }
}

/// HTTP翻译后端（DeepLX兼容的JSON接口）
pub struct HttpTranslationBackend {
    client: Client,
    api_url: String,
    source_lang: String,
    target_lang: String,
}

impl HttpTranslationBackend {
    /// 创建HTTP翻译后端
    pub fn new(api_url: &str, source_lang: &str, target_lang: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        })
    }

    /// 从运行配置创建
    pub fn from_config(config: &MirrorConfig) -> Result<Self> {
        Self::new(
            config.api_url(),
            config.source_lang(),
            config.target_lang(),
            Duration::from_secs(config.timeout_secs()),
        )
    }
}

#[async_trait]
impl TranslationBackend for HttpTranslationBackend {
    async fn translate(&self, text: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&json!({
                "text": text,
                "source_lang": self.source_lang,
                "target_lang": self.target_lang
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(mirror_error!(translation_api, status.as_u16(), body, self.api_url));
        }

        let response_text = response.text().await?;

        // 兼容 {"data": ...} / {"text": ...} / {"result": ...} 以及纯文本响应
        let translated =
            if let Ok(json_val) = serde_json::from_str::<serde_json::Value>(&response_text) {
                json_val
                    .get("data")
                    .or_else(|| json_val.get("text"))
                    .or_else(|| json_val.get("result"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or(response_text)
            } else {
                response_text
            };

        Ok(translated)
    }
}

/// 一次批量翻译的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// 输入文本条数
    pub texts: usize,
    /// 划分出的批次数
    pub batches: usize,
    /// 被拒绝并逐条回退的批次数
    pub rejected_batches: usize,
    /// 对后端的调用次数
    pub backend_calls: usize,
    /// 翻译失败而保留原文的条数
    pub untranslated: usize,
}

impl BatchStats {
    /// 累加另一份统计
    pub fn merge(&mut self, other: &BatchStats) {
        self.texts += other.texts;
        self.batches += other.batches;
        self.rejected_batches += other.rejected_batches;
        self.backend_calls += other.backend_calls;
        self.untranslated += other.untranslated;
    }
}

/// 批量翻译结果：译文与输入一一对应、顺序一致
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub translations: Vec<String>,
    pub stats: BatchStats,
}

/// 分批翻译器
pub struct BatchTranslator<B> {
    backend: B,
    batch_size: usize,
    max_batch_chars: usize,
    separator: String,
}

impl<B: TranslationBackend> BatchTranslator<B> {
    /// 创建分批翻译器
    pub fn new(backend: B, batch_size: usize, max_batch_chars: usize, separator: &str) -> Self {
        Self {
            backend,
            batch_size: batch_size.max(1),
            max_batch_chars,
            separator: separator.to_string(),
        }
    }

    /// 按运行配置中的批次参数创建
    pub fn from_config(backend: B, config: &MirrorConfig) -> Self {
        Self::new(
            backend,
            config.batch_size(),
            config.max_batch_chars(),
            config.separator(),
        )
    }

    /// 底层翻译后端
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 翻译有序文本列表
    ///
    /// 输出条数恒等于输入条数且顺序不变；后端异常只影响所在批次，不向上抛出。
    pub async fn translate_texts(&self, texts: &[String]) -> BatchOutput {
        let mut stats = BatchStats {
            texts: texts.len(),
            ..Default::default()
        };
        let mut translations = Vec::with_capacity(texts.len());

        for (batch_idx, batch) in texts.chunks(self.batch_size).enumerate() {
            stats.batches += 1;
            debug!("处理批次 {}: {} 个文本项", batch_idx + 1, batch.len());

            let parts = self.translate_batch(batch, &mut stats).await;
            translations.extend(parts);
        }

        info!(
            "🔤 翻译完成: {} 条文本, {} 个批次, {} 个批次回退逐条翻译, {} 次后端调用",
            stats.texts, stats.batches, stats.rejected_batches, stats.backend_calls
        );

        BatchOutput { translations, stats }
    }

    /// 翻译单个批次，必要时回退为逐条翻译
    async fn translate_batch(&self, batch: &[String], stats: &mut BatchStats) -> Vec<String> {
        if batch.len() == 1 {
            return self.translate_each(batch, stats).await;
        }

        let joined = batch.join(&self.separator);
        if joined.chars().count() >= self.max_batch_chars {
            debug!(
                "批次拼接长度 {} 达到上限 {}，逐条翻译",
                joined.chars().count(),
                self.max_batch_chars
            );
            stats.rejected_batches += 1;
            return self.translate_each(batch, stats).await;
        }

        stats.backend_calls += 1;
        match self.backend.translate(&joined).await {
            Ok(translated) => match self.split_translated(&translated, batch.len()) {
                Some(parts) => parts,
                None => {
                    warn!(
                        "⚠️ 批次译文段数不符或含空段 (期望 {}): {:?}，逐条翻译",
                        batch.len(),
                        translated
                    );
                    stats.rejected_batches += 1;
                    self.translate_each(batch, stats).await
                }
            },
            Err(e) => {
                warn!("❌ 批次翻译失败: {}，逐条翻译", e);
                stats.rejected_batches += 1;
                self.translate_each(batch, stats).await
            }
        }
    }

    /// 按分隔符拆分批次译文，段数与期望不符或出现空段时返回 `None`
    fn split_translated(&self, translated: &str, expected: usize) -> Option<Vec<String>> {
        let parts: Vec<String> = translated
            .split(self.separator.as_str())
            .map(|part| part.trim().to_string())
            .collect();

        if parts.len() == expected && parts.iter().all(|part| !part.is_empty()) {
            Some(parts)
        } else {
            None
        }
    }

    /// 逐条翻译；同一批次内的请求在当前任务上并发发出，结果保持原顺序
    async fn translate_each(&self, batch: &[String], stats: &mut BatchStats) -> Vec<String> {
        stats.backend_calls += batch.len();
        let results = join_all(batch.iter().map(|text| self.backend.translate(text))).await;

        batch
            .iter()
            .zip(results)
            .map(|(original, result)| match result {
                Ok(translated) if !translated.trim().is_empty() => translated.trim().to_string(),
                Ok(_) => {
                    warn!("⚠️ 译文为空，保留原文: {:?}", original);
                    stats.untranslated += 1;
                    original.clone()
                }
                Err(e) => {
                    warn!("❌ 翻译失败，保留原文 {:?}: {}", original, e);
                    stats.untranslated += 1;
                    original.clone()
                }
            })
            .collect()
    }
}
