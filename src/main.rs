use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::{
    admin::AdminCommand,
    chat::{Chat, SubmitOutcome},
    client::{ChatGateway, DashboardClient, HttpChatGateway},
    config::Config,
    connection::DirectConnection,
};

mod admin;
mod chat;
mod client;
mod config;
mod connection;
mod model;
mod prompt;
mod tui;

const LOG_CONFIG_PATH: &str = "log4rs.yaml";

/// 创建默认的log4rs配置文件
fn create_default_log4rs_config() -> anyhow::Result<()> {
    let default_config = r#"---
# log4rs.yaml
# 检查配置文件变动的时间间隔
refresh_rate: 30 seconds
# appender 负责将日志收集到控制台或文件, 可配置多个
appenders:
  stdout:
    kind: console
  file:
    kind: file
    path: "log/krishi-cli.log"
    encoder:
      # log 信息模式
      pattern: "[{d(%Y-%m-%d %H:%M:%S)}][{level}][{f}]:{line} - {m}{n}"
# 对全局 log 进行配置
root:
  level: warn
  appenders:
    - file
"#;
    std::fs::write(LOG_CONFIG_PATH, default_config)?;
    info!("已创建默认的log4rs.yaml配置文件，全局log等级为warn");
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "AI Krishi Sahayak: farming advice for Maharashtra districts", long_about = None)]
struct Args {
    /// 提问内容；单独使用时输出回答后退出，配合 --wait 作为第一个问题
    #[arg(short, long)]
    prompt: Option<String>,
    /// 行模式，从标准输入逐行提问
    #[arg(short, long, default_value_t = false)]
    wait: bool,
    /// 启动界面后直接以该问题进入对话
    #[arg(short, long)]
    ask: Option<String>,
    /// 区县，默认使用配置中的 default_district
    #[arg(short, long)]
    district: Option<String>,
    /// 配置文件路径（.json 或 .toml）
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// 后端地址，覆盖配置文件和环境变量
    #[arg(short, long)]
    url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 管理后台操作
    #[command(subcommand)]
    Admin(AdminCommand),
}

/// 按命令行参数加载配置
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::local()?,
    };
    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    if let Some(name) = &args.district {
        let Some(district) = config.find_district(name) else {
            bail!(
                "unknown district '{}', expected one of: {}",
                name,
                config.districts.join(", ")
            );
        };
        config.default_district = district.to_string();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !Path::new(LOG_CONFIG_PATH).exists() {
        create_default_log4rs_config()?;
    }
    log4rs::init_file(LOG_CONFIG_PATH, Default::default())?;
    info!(
        "启动参数 wait={} district={:?} config={:?} url={:?}",
        args.wait, args.district, args.config, args.url
    );

    let config = load_config(&args)?;

    if let Some(Command::Admin(command)) = args.command {
        return admin::run(&config, command).await;
    }

    if args.wait {
        wait_mode(config, args.prompt).await
    } else if let Some(prompt) = args.prompt {
        one_shot(config, &prompt).await
    } else {
        tui::run(config, args.ask)
            .await
            .map_err(|e| anyhow::anyhow!("{:?}", e))
    }
}

fn gateway(config: &Config) -> anyhow::Result<(Arc<dyn ChatGateway>, DashboardClient)> {
    let connection = DirectConnection::new(&config.base_url, config.request_timeout())?;
    let gateway = Arc::new(HttpChatGateway::new(connection.clone()));
    Ok((gateway, DashboardClient::new(connection)))
}

/// 最后一条回复
fn last_reply(chat: &Chat) -> Option<String> {
    chat.snapshot().turns.last().map(|t| t.content().to_string())
}

/// 单次提问，回答输出到标准输出
async fn one_shot(config: Config, prompt: &str) -> anyhow::Result<()> {
    let (gateway, _) = gateway(&config)?;
    let chat = Chat::new(&config.default_district, gateway, config.chat_texts());
    match chat.deliver_seed(prompt).await {
        SubmitOutcome::Answered => {
            println!("{}", last_reply(&chat).unwrap_or_default());
            Ok(())
        }
        SubmitOutcome::Fallback => {
            println!("{}", last_reply(&chat).unwrap_or_default());
            bail!("request to {} failed, see log for details", config.base_url)
        }
        SubmitOutcome::Rejected(reason) => bail!("prompt not submitted: {:?}", reason),
        SubmitOutcome::Discarded => Ok(()),
    }
}

/// 行模式下的一行输入
#[derive(Debug, PartialEq, Eq)]
enum LineCommand {
    Empty,
    Exit,
    Help,
    End,
    District(String),
    Prices,
    Weather,
    /// 补贴方案，可按分类过滤
    Schemes(Option<String>),
    Ask(String),
}

fn parse_line(line: &str) -> LineCommand {
    let line = line.trim();
    if line.is_empty() {
        return LineCommand::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return LineCommand::Exit;
    }
    let Some(command) = line.strip_prefix('/') else {
        return LineCommand::Ask(line.to_string());
    };
    let (name, args) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    match name.to_ascii_lowercase().as_str() {
        "exit" | "quit" => LineCommand::Exit,
        "end" => LineCommand::End,
        "district" => LineCommand::District(args.trim().to_string()),
        "prices" => LineCommand::Prices,
        "weather" => LineCommand::Weather,
        "schemes" => {
            let category = args.trim();
            LineCommand::Schemes((!category.is_empty()).then(|| category.to_string()))
        }
        "help" => LineCommand::Help,
        _ => LineCommand::Ask(line.to_string()),
    }
}

fn print_help() {
    println!("Commands: /district <name>, /end (new conversation), /prices, /weather, /schemes [category], /help, exit");
}

async fn wait_mode(config: Config, seed: Option<String>) -> anyhow::Result<()> {
    use std::io::{self, BufRead, Write};

    let (gateway, dashboard) = gateway(&config)?;
    let new_chat = |district: &str| Chat::new(district, gateway.clone(), config.chat_texts());
    let mut chat = new_chat(&config.default_district);

    println!("AI Krishi Sahayak ({}), type 'exit' to quit", config.base_url);
    print_help();
    println!("{}", last_reply(&chat).unwrap_or_default());

    if let Some(seed) = seed {
        println!("[{}] > {}", chat.region(), seed);
        print_outcome(&chat, chat.deliver_seed(&seed).await);
    }

    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    let mut buffer = String::new();
    loop {
        buffer.clear();
        print!("[{}] > ", chat.region());
        io::stdout().flush().context("flush stdout")?;

        // EOF
        if stdin_lock.read_line(&mut buffer).context("读取输入失败")? == 0 {
            break;
        }

        match parse_line(&buffer) {
            LineCommand::Empty => continue,
            LineCommand::Exit => break,
            LineCommand::Help => print_help(),
            LineCommand::End => {
                chat = new_chat(&chat.region());
                println!("{}", last_reply(&chat).unwrap_or_default());
            }
            LineCommand::District(name) => match config.find_district(&name) {
                Some(district) => {
                    if chat.change_region(district) {
                        println!("{}", last_reply(&chat).unwrap_or_default());
                    }
                }
                None => println!(
                    "Unknown district '{}'. Available: {}",
                    name,
                    config.districts.join(", ")
                ),
            },
            LineCommand::Prices => match dashboard.prices().await {
                Ok(prices) => {
                    for p in prices {
                        println!("  {:<12} ₹{:<8.0} {}", p.commodity, p.price, p.change);
                    }
                }
                Err(e) => {
                    warn!("获取市场价格失败: {}", e);
                    println!("Prices unavailable");
                }
            },
            LineCommand::Weather => match dashboard.weather(&chat.region()).await {
                Ok(w) => println!("  {:.0}°C, {}", w.temp, w.weather),
                Err(e) => {
                    warn!("获取天气失败: {}", e);
                    println!("Weather unavailable");
                }
            },
            LineCommand::Schemes(category) => match dashboard.subsidies(category.as_deref()).await {
                Ok(schemes) if schemes.is_empty() => println!("No schemes found"),
                Ok(schemes) => {
                    for s in schemes {
                        println!("  {} ({}): {}", s.name, s.kind, s.benefit);
                    }
                }
                Err(e) => {
                    warn!("获取补贴方案失败: {}", e);
                    println!("Schemes unavailable");
                }
            },
            LineCommand::Ask(text) => print_outcome(&chat, chat.submit(&text).await),
        }
    }
    Ok(())
}

fn print_outcome(chat: &Chat, outcome: SubmitOutcome) {
    match outcome {
        SubmitOutcome::Answered | SubmitOutcome::Fallback => {
            println!("{}\n", last_reply(chat).unwrap_or_default());
        }
        SubmitOutcome::Rejected(reason) => info!("提交被拒绝: {:?}", reason),
        SubmitOutcome::Discarded => {}
    }
}
