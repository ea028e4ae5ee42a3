//! counsel-admin: カウンセリング管理バックエンドの操作用CLI

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use counsel_admin::admin::{CertificateQuery, CertificateReviewForm, CertificateStatus, WithdrawalStatus};
use counsel_admin::api::auth::{decode_claims, SessionStorage};
use counsel_admin::booking::{BookingQuery, BookingStatus, CountdownTicker, SystemClock};
use counsel_admin::reports::ReportCode;
use counsel_admin::survey::{history_by_date, score_bars, SurveyResult};
use counsel_admin::{
    utils, AdminClient, AppConfig, BookingId, ConfigManager, DashboardSection, LoadState, MemberId,
    SessionStore, SurveyType,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Counseling platform admin client")]
struct Cli {
    /// 設定ファイル（省略時はXDG設定ディレクトリ）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// APIのベースURLを上書き
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// ログレベルを上書き
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// トークンを保存してログイン
    Login {
        #[arg(long)]
        token: String,
    },
    /// 保存済みセッションを破棄
    Logout,
    #[command(flatten)]
    Admin(AdminCommand),
}

/// ログイン済みで実行するコマンド
#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// 予約一覧
    Bookings(PageArgs),
    /// 会員の最新診断結果
    Results(MemberArgs),
    /// 会員の診断履歴（日付別）
    History(MemberArgs),
    /// カップル診断
    Couple {
        #[arg(long)]
        booking: String,
    },
    /// 診断レポートを送信（1: 一人目, 2: 二人目, 3: 両方, 4: 相性分析）
    SendReport {
        #[arg(long)]
        booking: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
        code: u8,
    },
    /// 終了済み予約のレビュー期限
    Countdown {
        #[command(flatten)]
        page: PageArgs,
        /// 一度だけ表示して終了
        #[arg(long)]
        once: bool,
    },
    /// 資格証明の一覧・審査
    Certificates {
        #[command(subcommand)]
        action: CertificateAction,
    },
    /// 出金申請の一覧・状態変更
    Withdrawals {
        #[command(subcommand)]
        action: WithdrawalAction,
    },
    /// お知らせ一覧
    Notifications(PageArgs),
    /// 性格タイプの参照データ
    PersonalityTypes {
        #[command(subcommand)]
        action: PersonalityTypeAction,
    },
}

#[derive(Args, Debug, Clone)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    size: Option<u32>,
    #[arg(long)]
    status: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct MemberArgs {
    #[arg(long)]
    member: String,
    #[arg(long)]
    booking: String,
}

#[derive(Subcommand, Debug)]
enum CertificateAction {
    List(PageArgs),
    Approve {
        id: String,
    },
    Reject {
        id: String,
        #[arg(long)]
        note: String,
    },
}

#[derive(Subcommand, Debug)]
enum PersonalityTypeAction {
    List {
        /// 1: MBTI, 2: DISC, 3: Love Language, 4: Big Five
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
        survey: Option<u8>,
    },
    Show {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum WithdrawalAction {
    List {
        #[arg(long)]
        status: Option<String>,
    },
    Update {
        id: String,
        /// APPROVED / REJECTED / PAID
        status: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config()?;
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log.log_level = level.clone();
    }

    let _log_guard = utils::init_logging(&config.log)?;
    tracing::debug!(config = %manager.config_path().display(), "⚙️ Configuration ready");

    let session = SessionStore::hydrate(SessionStorage::with_default_dir()?);
    run(cli.command, &config, session).await
}

async fn run(command: Command, config: &AppConfig, session: SessionStore) -> anyhow::Result<()> {
    match command {
        Command::Login { token } => {
            let claims = decode_claims(&token)?;
            session.set_token(token)?;
            println!("Signed in as {} ({})", claims.subject.unwrap_or_default(), claims.role);
            if let Some(expires_at) = claims.expires_at {
                println!("Session expires at {}", expires_at.to_rfc3339());
            }
            println!("Available sections: {:?}", claims.role.sections());
            Ok(())
        }
        Command::Logout => {
            session.clear()?;
            println!("Signed out");
            Ok(())
        }
        Command::Admin(command) => {
            let client = AdminClient::connect(config, session)?;
            let result = run_signed_in(command, &client).await;
            for toast in client.notifications().drain() {
                println!("[{:?}] {}", toast.level, toast.message);
            }
            if let Some(metrics) = client.metrics() {
                tracing::debug!(
                    requests = metrics.total_requests,
                    errors = metrics.total_errors,
                    "📊 API metrics"
                );
            }
            result
        }
    }
}

async fn run_signed_in(command: AdminCommand, client: &AdminClient) -> anyhow::Result<()> {
    match command {
        AdminCommand::Bookings(args) => {
            client.require(DashboardSection::Bookings)?;
            let page = client.bookings().list(&booking_query(client, &args)).await?;
            println!("Page {}/{} ({} bookings)", page.page, page.total_pages.max(1), page.total_count);
            for booking in &page.data {
                let members: Vec<&str> = booking.members.iter().map(|m| m.name.as_str()).collect();
                println!(
                    "{}  {}  {} - {}  {}",
                    booking.id,
                    booking.status,
                    booking.start_time.with_timezone(&client.display_offset()).format("%Y/%m/%d %H:%M"),
                    booking.end_time.with_timezone(&client.display_offset()).format("%H:%M"),
                    members.join(" & ")
                );
            }
        }
        AdminCommand::Results(args) => {
            client.require(DashboardSection::Surveys)?;
            let (set, report) = client
                .surveys()
                .fetch_member_results(&MemberId::from(args.member.as_str()), &BookingId::from(args.booking.as_str()))
                .await?;
            if set.is_empty() {
                println!("No survey results");
            }
            for result in set.latest_by_type() {
                print_result(result);
            }
            if !report.ignored.is_empty() {
                tracing::debug!(ignored = report.ignored.len(), "Some details were unavailable");
            }
        }
        AdminCommand::History(args) => {
            client.require(DashboardSection::Surveys)?;
            let (set, _) = client
                .surveys()
                .fetch_member_results(&MemberId::from(args.member.as_str()), &BookingId::from(args.booking.as_str()))
                .await?;
            for bucket in history_by_date(set.all(), client.display_offset()) {
                println!("== {} ==", bucket.label);
                for result in &bucket.entries {
                    println!("  {}: {}", result.survey_type, result.label);
                }
            }
        }
        AdminCommand::Couple { booking } => {
            client.require(DashboardSection::Surveys)?;
            match client.couple_surveys().fetch_couple_snapshot(&BookingId::from(booking.as_str())).await {
                LoadState::Ready(snapshot) => {
                    for survey_type in SurveyType::ALL {
                        let Some(pair) = snapshot.pair(survey_type) else {
                            continue;
                        };
                        let label = |r: &Option<SurveyResult>| {
                            r.as_ref().map(|r| r.label.clone()).unwrap_or_else(|| "-".to_string())
                        };
                        println!("{}: {} / {}", survey_type, label(&pair.first), label(&pair.second));
                    }
                    if let Some(compatibility) = &snapshot.compatibility {
                        println!("Compatibility {}/100: {}", compatibility.score, compatibility.description);
                    }
                }
                LoadState::Failed(notice) => bail!(notice.message),
                _ => println!("No couple survey data"),
            }
        }
        AdminCommand::SendReport { booking, code } => {
            client.require(DashboardSection::Bookings)?;
            let code = ReportCode::from_code(code).context("Unknown report code")?;
            client.reports().send(&BookingId::from(booking.as_str()), code).await?;
        }
        AdminCommand::Countdown { page, once } => {
            client.require(DashboardSection::Bookings)?;
            let mut query = booking_query(client, &page);
            query.status.get_or_insert(BookingStatus::Finished);
            let bookings = client.bookings().list(&query).await?.data;

            let ticker = CountdownTicker::start(bookings, Arc::new(SystemClock), client.ticker_config());
            let mut updates = ticker.subscribe();
            loop {
                let board = updates.borrow_and_update().clone();
                for state in board.entries() {
                    let badge = if state.is_expired { "expired".to_string() } else { state.display() };
                    println!("{}  {}", state.booking_id, badge);
                }
                if once || board.is_empty() {
                    break;
                }
                println!("--");
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
        AdminCommand::Certificates { action } => {
            client.require(DashboardSection::Certificates)?;
            let service = client.certificates();
            match action {
                CertificateAction::List(args) => {
                    let query = CertificateQuery {
                        page: args.page,
                        size: args.size.unwrap_or(client.page_size()),
                        status: args.status.map(CertificateStatus::from),
                    };
                    for certificate in service.list(&query).await?.data {
                        println!(
                            "{}  {}  {}  {}",
                            certificate.id,
                            certificate.status.as_api_str(),
                            certificate.counselor_name,
                            certificate.title
                        );
                    }
                }
                CertificateAction::Approve { id } => {
                    service.review(&mut [], &id, &CertificateReviewForm::approve()).await?;
                    println!("Approved {}", id);
                }
                CertificateAction::Reject { id, note } => {
                    service.review(&mut [], &id, &CertificateReviewForm::reject(note)).await?;
                    println!("Rejected {}", id);
                }
            }
        }
        AdminCommand::Withdrawals { action } => {
            client.require(DashboardSection::Withdrawals)?;
            let service = client.withdrawals();
            match action {
                WithdrawalAction::List { status } => {
                    let status = status.as_deref().map(parse_withdrawal_status).transpose()?;
                    for withdrawal in service.list(status).await? {
                        println!(
                            "{}  {}  {:.2}  {}",
                            withdrawal.id, withdrawal.status, withdrawal.amount, withdrawal.counselor_name
                        );
                    }
                }
                WithdrawalAction::Update { id, status } => {
                    let next = parse_withdrawal_status(&status)?;
                    let mut withdrawals = service.list(None).await?;
                    service.update_status(&mut withdrawals, &id, next).await?;
                    println!("{} -> {}", id, next);
                }
            }
        }
        AdminCommand::Notifications(args) => {
            client.require(DashboardSection::Notifications)?;
            let page = client
                .notification_feed()
                .list(args.page, args.size.unwrap_or(client.page_size()))
                .await?;
            println!("{} unread", counsel_admin::admin::unread_count(&page.data));
            for item in &page.data {
                println!("{} {}  {}", if item.read { " " } else { "*" }, item.title, item.message);
            }
        }
        AdminCommand::PersonalityTypes { action } => {
            client.require(DashboardSection::PersonalityTypes)?;
            let service = client.personality_types();
            match action {
                PersonalityTypeAction::List { survey } => {
                    let survey_type = survey.and_then(SurveyType::from_survey_id);
                    for personality in service.list(survey_type).await? {
                        let kind = personality
                            .survey_type()
                            .map(|t| t.to_string())
                            .unwrap_or_else(|| "-".to_string());
                        println!("{}  {}  {}", personality.id, kind, personality.name);
                    }
                }
                PersonalityTypeAction::Show { name } => match service.detail(&name).await? {
                    Some(detail) => {
                        println!("{}", detail.long_description.unwrap_or_default());
                        if !detail.strengths.is_empty() {
                            println!("Strengths: {}", detail.strengths.join(", "));
                        }
                        if !detail.weaknesses.is_empty() {
                            println!("Weaknesses: {}", detail.weaknesses.join(", "));
                        }
                    }
                    None => println!("No personality type named {}", name),
                },
            }
        }
    }
    Ok(())
}

fn booking_query(client: &AdminClient, args: &PageArgs) -> BookingQuery {
    BookingQuery {
        page: args.page,
        size: args.size.unwrap_or(client.page_size()),
        status: args.status.as_deref().map(BookingStatus::parse),
    }
}

fn parse_withdrawal_status(raw: &str) -> anyhow::Result<WithdrawalStatus> {
    WithdrawalStatus::parse(raw).with_context(|| format!("Unknown withdrawal status: {}", raw))
}

fn print_result(result: &SurveyResult) {
    println!("[{}] {}", result.survey_type, result.label);
    if !result.description.is_empty() {
        println!("  {}", utils::preview(&result.description, 120));
    }
    for bar in score_bars(&result.scores) {
        let width = (bar.percent / 5.0).round() as usize;
        println!("  {:<16} {:>6.1} {}", bar.trait_name, bar.value, "#".repeat(width));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_and_admin_commands_are_separate() {
        let cli = Cli::try_parse_from(["counsel-admin", "login", "--token", "a.b.c"]).unwrap();
        assert!(matches!(cli.command, Command::Login { ref token } if token == "a.b.c"));

        let cli = Cli::try_parse_from(["counsel-admin", "bookings", "--page", "2"]).unwrap();
        assert!(matches!(cli.command, Command::Admin(AdminCommand::Bookings(PageArgs { page: 2, .. }))));

        let cli = Cli::try_parse_from(["counsel-admin", "personality-types", "list", "--survey", "2"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Admin(AdminCommand::PersonalityTypes {
                action: PersonalityTypeAction::List { survey: Some(2) }
            })
        ));

        assert!(Cli::try_parse_from(["counsel-admin", "personality-types", "list", "--survey", "9"]).is_err());
    }
}
