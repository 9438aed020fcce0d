use anyhow::Result;
use exam_session::utils::logging;
use exam_session::{App, Command, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    // 初始化并运行应用
    App::initialize(config)?.run(command).await?;

    Ok(())
}
