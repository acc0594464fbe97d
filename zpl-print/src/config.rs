use std::path::PathBuf;

use zpl_printer::DEFAULT_ENCODING;

/// zpl-print 配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | ZPL_ENCODING | windows-1252 | 打印数据编码 (WHATWG 标签) |
/// | ZPL_DOC_NAME | Raw Label | 打印队列中的文档名 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 日志文件目录，按天滚动 |
///
/// 命令行参数优先于环境变量。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 打印数据编码
    pub encoding: String,
    /// 文档名
    pub doc_name: String,
    /// trace | debug | info | warn | error
    pub log_level: String,
    /// 日志目录 (同时输出到 stderr)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            encoding: std::env::var("ZPL_ENCODING").unwrap_or_else(|_| DEFAULT_ENCODING.into()),
            doc_name: std::env::var("ZPL_DOC_NAME").unwrap_or_else(|_| "Raw Label".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR")
                .ok()
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// 使用命令行参数覆盖部分配置
    pub fn with_overrides(
        mut self,
        encoding: Option<&str>,
        doc_name: Option<&str>,
        log_level: Option<&str>,
        log_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(encoding) = encoding {
            self.encoding = encoding.to_string();
        }
        if let Some(doc_name) = doc_name {
            self.doc_name = doc_name.to_string();
        }
        if let Some(log_level) = log_level {
            self.log_level = log_level.to_string();
        }
        if log_dir.is_some() {
            self.log_dir = log_dir;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
