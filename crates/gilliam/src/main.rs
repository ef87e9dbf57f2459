mod commands;
mod context;
mod utils;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use context::Context;
use gilliam_build::BuildError;

#[derive(Parser)]
#[command(name = "gilliam")]
#[command(about = "Gilliam のフォーメーションをビルド・リリース・運用する", long_about = None)]
struct Cli {
    /// ステージ名（省略時は .gilliam/stage）
    #[arg(short = 's', long, env = "GILLIAM_STAGE")]
    stage: Option<String>,

    /// フォーメーション名（省略時は .gilliam/formation）
    #[arg(short = 'f', long, env = "GILLIAM_FORMATION")]
    formation: Option<String>,

    /// 出力を最小限にする
    #[arg(short, long)]
    quiet: bool,

    /// デバッグログを表示
    #[arg(short = 'D', long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// `release` と `deploy` に共通のオプション
#[derive(Args, Debug, Clone)]
pub struct ReleaseArgs {
    /// リリースの作成者（省略時は実行ユーザー）
    #[arg(long)]
    author: Option<String>,

    /// リリースメッセージ
    #[arg(short, long)]
    message: Option<String>,

    /// ビルドしたイメージをプッシュしない
    #[arg(long)]
    no_push: bool,

    /// 以前のリリースの環境変数を引き継がない
    #[arg(long)]
    override_env: bool,

    /// リリース名が競合したときの最大試行回数
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// フォーメーションを作成
    Create {
        /// フォーメーション名
        formation: String,
    },
    /// サービスをビルドしてリリースを作成
    Release(ReleaseArgs),
    /// リリースを作成してマイグレーション
    Deploy {
        #[command(flatten)]
        release: ReleaseArgs,
        /// 少しずつ入れ替える
        #[arg(long)]
        rate: Option<String>,
    },
    /// 指定リリースへマイグレーション
    Migrate {
        /// リリース名
        release: String,
        /// 少しずつ入れ替える
        #[arg(long)]
        rate: Option<String>,
    },
    /// リリースのインスタンス数を変更
    Scale {
        /// リリース名
        release: String,
        /// NAME=COUNT
        #[arg(required = true, num_args = 1..)]
        scales: Vec<String>,
        /// 少しずつ変更する
        #[arg(long)]
        rate: Option<String>,
    },
    /// リリース一覧を表示
    Releases {
        /// 指定リリースを YAML で出力
        #[arg(long, value_name = "NAME")]
        dump: Option<String>,
    },
    /// インスタンス一覧を表示
    Ps {
        /// 詳細を表示
        #[arg(short, long)]
        verbose: bool,
    },
    /// リリースのサービスからインスタンスを1つ起動
    Spawn {
        /// サービス名
        service: String,
        /// リリース名（省略時は最新）
        #[arg(short, long, value_name = "NAME")]
        release: Option<String>,
        /// 割り当て先
        #[arg(long, value_name = "NAME")]
        assigned_to: Option<String>,
        /// ポート指定（[PUBLIC:]PRIVATE）
        #[arg(short, long = "port")]
        ports: Vec<String>,
        /// 配置要件
        #[arg(long = "require")]
        requirements: Vec<String>,
        /// ランク
        #[arg(long)]
        rank: Option<u32>,
    },
    /// リリースマニフェストからフォーメーションを立ち上げる
    Launch {
        /// マニフェスト（ファイル、`-`、または http(s) URL）
        manifest: String,
        /// フォーメーションを作成する
        #[arg(long)]
        create: bool,
        /// 各サービスを1インスタンスにスケール
        #[arg(long)]
        scale: bool,
    },
    /// エグゼキュータでコマンドを実行
    Run {
        /// エグゼキュータのインスタンス名（省略時はランダム）
        #[arg(long)]
        executor: Option<String>,
        /// IMAGE をサービス名として扱う
        #[arg(short, long)]
        service: bool,
        /// リリース名またはリリースマニフェスト
        #[arg(short, long, value_name = "NAME")]
        release: Option<String>,
        /// 環境変数（VAR=VALUE または VAR）
        #[arg(short, long = "env", value_name = "VAR")]
        env: Vec<String>,
        /// TTY を割り当てる
        #[arg(short, long)]
        tty: bool,
        /// イメージ名
        image: String,
        /// 実行するコマンド
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// レジストリの認証情報を保存
    Auth {
        /// レジストリ（省略時はステージのリポジトリから）
        #[arg(short, long)]
        registry: Option<String>,
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// ルートの一覧・作成・削除
    Route {
        /// ルートを削除
        #[arg(short, long)]
        delete: bool,
        /// [DOMAIN:]PATH、削除時はルート名
        route: Option<String>,
        /// 転送先
        target: Option<String>,
    },
    /// バージョン情報を表示
    Version,
}

fn init_logging(debug: bool, quiet: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_max_level(level)
        .init();
}

/// エラーを1行の診断メッセージにする
fn describe(error: &anyhow::Error) -> String {
    if let Some(hint) = error.downcast_ref::<BuildError>().and_then(BuildError::hint) {
        tracing::debug!("hint: {hint}");
    }
    format!("{error:#}").replace('\n', " ")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.quiet);

    match dispatch(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), describe(&e));
            std::process::exit(1);
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    // Versionコマンドは設定不要
    if matches!(cli.command, Commands::Version) {
        println!("gilliam {}", env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }

    let ctx = Context::discover(cli.stage, cli.formation, cli.quiet)?;

    match cli.command {
        Commands::Create { formation } => commands::create::handle(&ctx, &formation).await?,
        Commands::Release(args) => {
            commands::release::handle(&ctx, &args).await?;
        }
        Commands::Deploy { release, rate } => {
            commands::release::deploy(&ctx, &release, rate.as_deref()).await?
        }
        Commands::Migrate { release, rate } => {
            commands::migrate::migrate(&ctx, &release, rate.as_deref()).await?
        }
        Commands::Scale {
            release,
            scales,
            rate,
        } => commands::migrate::scale(&ctx, &release, &scales, rate.as_deref()).await?,
        Commands::Releases { dump } => commands::releases::handle(&ctx, dump.as_deref()).await?,
        Commands::Ps { verbose } => commands::ps::handle(&ctx, verbose).await?,
        Commands::Spawn {
            service,
            release,
            assigned_to,
            ports,
            requirements,
            rank,
        } => {
            let placement = commands::spawn::Placement {
                assigned_to,
                requirements,
                rank,
            };
            commands::spawn::handle(&ctx, &service, release.as_deref(), &ports, placement).await?
        }
        Commands::Launch {
            manifest,
            create,
            scale,
        } => commands::launch::handle(&ctx, &manifest, create, scale).await?,
        Commands::Run {
            executor,
            service,
            release,
            env,
            tty,
            image,
            command,
        } => {
            let options = commands::run::RunOptions {
                executor,
                service,
                release,
                env,
                tty,
                image,
                command,
            };
            return commands::run::handle(&ctx, options).await;
        }
        Commands::Auth {
            registry,
            username,
            password,
        } => commands::auth::handle(&ctx, registry, username, password).await?,
        Commands::Route {
            delete,
            route,
            target,
        } => commands::route::handle(&ctx, delete, route.as_deref(), target.as_deref()).await?,
        Commands::Version => {}
    }
    Ok(0)
}

