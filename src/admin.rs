use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Subcommand;
use log::{error, info};

use crate::{
    client::{AdminClient, admin_client::NewScheme},
    config::Config,
    connection::DirectConnection,
    model::param::AdminStatus,
};

/// 管理后台命令
#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommand {
    /// 验证管理员账号
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "KRISHI_ADMIN_PASSWORD")]
        password: String,
    },
    /// 新增补贴方案，分类不存在时后端会新建
    AddScheme {
        #[arg(short, long)]
        category: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        benefit: String,
        /// 方案类型，如 Central / State
        #[arg(short = 't', long = "type", default_value = "Central")]
        kind: String,
    },
    /// 上传区县资料文件，后端会加入检索库
    Upload { file: PathBuf },
    /// 追加补充背景资料
    UpdateContext {
        /// 直接给出文本
        #[arg(conflicts_with = "file")]
        text: Option<String>,
        /// 从文件读取文本
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// 执行管理命令，失败时返回错误让进程以非零状态退出
pub async fn run(config: &Config, command: AdminCommand) -> anyhow::Result<()> {
    let connection = DirectConnection::new(&config.base_url, config.request_timeout())?;
    let client = AdminClient::new(connection);
    info!("执行管理命令，后端 {}", config.base_url);
    match command {
        AdminCommand::Login { username, password } => {
            let status = client.login(&username, &password).await.context("login failed")?;
            report(status)
        }
        AdminCommand::AddScheme {
            category,
            name,
            benefit,
            kind,
        } => {
            let scheme = NewScheme {
                category,
                name,
                benefit,
                kind,
            };
            client.add_scheme(&scheme).await.context("add scheme failed")?;
            println!("Scheme '{}' added to {}", scheme.name, scheme.category);
            Ok(())
        }
        AdminCommand::Upload { file } => {
            let status = client
                .upload_district_data(&file)
                .await
                .with_context(|| format!("upload of {} failed", file.display()))?;
            report(status)
        }
        AdminCommand::UpdateContext { text, file } => {
            let text = context_text(text, file).await?;
            let status = client.update_context(&text).await.context("update context failed")?;
            report(status)
        }
    }
}

async fn context_text(text: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))?,
        (None, None) => bail!("context text is required (argument or --file)"),
    };
    if text.trim().is_empty() {
        bail!("context text is empty");
    }
    Ok(text)
}

fn report(status: AdminStatus) -> anyhow::Result<()> {
    if status.is_success() {
        println!("{}", status.message);
        Ok(())
    } else {
        error!("管理命令失败: {}", status.message);
        bail!("{}", status.message)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::connection::common::testserver;

    #[tokio::test]
    async fn test_context_text_sources() {
        assert_eq!(context_text(Some("rain".into()), None).await.unwrap(), "rain");
        assert!(context_text(None, None).await.is_err());
        assert!(context_text(Some("  ".into()), None).await.is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Latur soil is black cotton soil").unwrap();
        let text = context_text(None, Some(file.path().to_path_buf())).await.unwrap();
        assert_eq!(text, "Latur soil is black cotton soil");
    }

    #[test]
    fn test_report_error_status() {
        let ok = AdminStatus {
            status: "success".into(),
            message: "Context updated".into(),
        };
        assert!(report(ok).is_ok());
        let err = AdminStatus {
            status: "error".into(),
            message: "disk full".into(),
        };
        assert_eq!(report(err).unwrap_err().to_string(), "disk full");
    }

    #[tokio::test]
    async fn test_run_update_context() {
        let (url, rx) =
            testserver::serve_once("200 OK", r#"{"status":"success","message":"Context updated"}"#).await;
        let config = Config {
            base_url: url,
            ..Config::default()
        };
        let command = AdminCommand::UpdateContext {
            text: Some("Nashik grapes".into()),
            file: None,
        };
        run(&config, command).await.unwrap();
        let raw = rx.await.unwrap();
        assert!(raw.starts_with("POST /admin/update_context "));
        assert!(raw.contains("context_text=Nashik+grapes"));
    }

    #[tokio::test]
    async fn test_run_login_rejected_is_error() {
        let (url, _rx) = testserver::serve_once(
            "401 Unauthorized",
            r#"{"status":"error","message":"Invalid credentials"}"#,
        )
        .await;
        let config = Config {
            base_url: url,
            ..Config::default()
        };
        let command = AdminCommand::Login {
            username: "admin".into(),
            password: "wrong".into(),
        };
        assert!(run(&config, command).await.is_err());
    }
}
