//! 邮件模板系统
//!
//! 每类邮件由一对模板组成：`{name}.txt` 与 `{name}.html`。

use notes_errors::{AppError, AppResult};
use std::collections::HashMap;
use tera::Tera;

/// 渲染结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// 邮件模板管理器
pub struct EmailTemplate {
    tera: Tera,
}

impl EmailTemplate {
    /// 从内存中的模板字符串创建
    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        Ok(Self { tera })
    }

    /// 渲染单个模板
    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> AppResult<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| AppError::internal(format!("Failed to create template context: {}", e)))?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::internal(format!(
                "Failed to render template {}: {}",
                template_name, e
            ))
        })
    }

    /// 渲染纯文本 + HTML 两个版本
    pub fn render_pair(
        &self,
        name: &str,
        subject: impl Into<String>,
        context: &serde_json::Value,
    ) -> AppResult<RenderedEmail> {
        let text = self.render(&format!("{}.txt", name), context)?;
        let html = self.render(&format!("{}.html", name), context)?;

        Ok(RenderedEmail {
            subject: subject.into(),
            text,
            html,
        })
    }
}
