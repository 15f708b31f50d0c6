//! Command-line client for household core.
//!
//! # Responsibility
//! - Verify `household_core` linkage (`ping`, `version`).
//! - Query a running household API through the HTTP gateway.
//! - Create or edit a household and its members through one save.

use clap::{Parser, Subcommand};
use household_core::{
    default_log_level, init_logging, EditSession, FetchHouseholdsRequest, GatewayConfig,
    HouseholdField, HttpGateway, Member, MemberId, PersistenceGateway, Relationship,
    SaveOrchestrator, SaveOutcome,
};
use std::process::ExitCode;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "household", version, about = "Household editing client")]
struct Cli {
    /// API base URL; overrides environment and config file.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print `pong` from the core crate.
    Ping,
    /// Print the core crate version.
    Version,
    /// Search households by email or phone substring.
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Load one household with its members.
    Show { household_uid: String },
    /// Create a household with its members.
    Create {
        #[command(flatten)]
        fields: FieldArgs,
        /// New member as `family,given,birthday,relationship`; repeatable.
        #[arg(long = "member")]
        members: Vec<MemberSpec>,
    },
    /// Edit an existing household and save the changes.
    Edit {
        household_uid: String,
        #[command(flatten)]
        fields: FieldArgs,
        /// New member as `family,given,birthday,relationship`; repeatable.
        #[arg(long = "member")]
        members: Vec<MemberSpec>,
        /// Replacement as `member_uid:family,given,birthday,relationship`; repeatable.
        #[arg(long = "update")]
        updates: Vec<MemberUpdate>,
        /// Persisted member uid to remove; repeatable.
        #[arg(long = "remove")]
        removals: Vec<String>,
    },
}

#[derive(clap::Args)]
struct FieldArgs {
    #[arg(long)]
    phone_number: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    zip_code: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

impl FieldArgs {
    fn apply(self, session: &mut EditSession) {
        let values = [
            (HouseholdField::PhoneNumber, self.phone_number),
            (HouseholdField::Email, self.email),
            (HouseholdField::ZipCode, self.zip_code),
            (HouseholdField::Address, self.address),
        ];
        for (field, value) in values {
            if let Some(value) = value {
                session.set_household_field(field, value);
            }
        }
    }
}

#[derive(Clone, Debug)]
struct MemberSpec {
    family_name: String,
    given_name: String,
    birthday: String,
    relationship: Option<Relationship>,
}

impl FromStr for MemberSpec {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        let [family_name, given_name, birthday, relationship] = parts.as_slice() else {
            return Err(format!(
                "expected `family,given,birthday,relationship`, got `{value}`"
            ));
        };
        let relationship = if relationship.is_empty() {
            None
        } else {
            Some(relationship.parse::<Relationship>().map_err(|err| err.to_string())?)
        };
        Ok(Self {
            family_name: family_name.to_string(),
            given_name: given_name.to_string(),
            birthday: birthday.to_string(),
            relationship,
        })
    }
}

#[derive(Clone, Debug)]
struct MemberUpdate {
    uid: String,
    spec: MemberSpec,
}

impl FromStr for MemberUpdate {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (uid, spec) = value
            .split_once(':')
            .ok_or_else(|| format!("expected `member_uid:family,given,...`, got `{value}`"))?;
        if uid.trim().is_empty() {
            return Err("member uid cannot be empty".to_string());
        }
        Ok(Self {
            uid: uid.trim().to_string(),
            spec: spec.parse()?,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Ping => println!("household_core ping={}", household_core::ping()),
        Command::Version => println!("household_core version={}", household_core::core_version()),
        Command::Search {
            query,
            offset,
            limit,
        } => {
            let gateway = connect(cli.base_url.as_deref())?;
            let response = gateway
                .fetch_households(&FetchHouseholdsRequest::new(query, offset, limit))
                .await
                .map_err(|err| err.to_string())?;
            println!("count={}", response.count);
            for household in response.households {
                println!(
                    "{}\t{}\t{}\t{}",
                    household.uid,
                    household.name.as_deref().unwrap_or("-"),
                    household.phone_number,
                    household.email
                );
            }
        }
        Command::Show { household_uid } => {
            let gateway = connect(cli.base_url.as_deref())?;
            let (session, report) = EditSession::load(&gateway, &household_uid).await;
            if let Some(err) = &report.household_error {
                eprintln!("household unavailable: {err}");
            }
            if let Some(err) = &report.members_error {
                eprintln!("members unavailable: {err}");
            }
            let fields = session.fields();
            println!("household={household_uid}");
            println!("phone_number={}", fields.phone_number);
            println!("email={}", fields.email);
            println!("zip_code={}", fields.zip_code);
            println!("address={}", fields.address);
            for member in session.members() {
                println!(
                    "member {}\t{} {}\t{}\t{}",
                    member.id,
                    member.family_name,
                    member.given_name,
                    member.birthday,
                    member.relationship.map(|r| r.as_str()).unwrap_or("-")
                );
            }
            if !report.is_complete() {
                return Err("load incomplete".to_string());
            }
        }
        Command::Create { fields, members } => {
            let gateway = connect(cli.base_url.as_deref())?;
            let mut session = EditSession::new();
            fields.apply(&mut session);
            for spec in members {
                add_member(&mut session, spec);
            }
            save(gateway, &mut session).await?;
        }
        Command::Edit {
            household_uid,
            fields,
            members,
            updates,
            removals,
        } => {
            let gateway = connect(cli.base_url.as_deref())?;
            let (mut session, report) = EditSession::load(&gateway, &household_uid).await;
            if !report.is_complete() {
                // A partial load would save empty fields over the stored ones.
                return Err(format!("household {household_uid} could not be loaded"));
            }
            fields.apply(&mut session);
            for update in updates {
                let id = MemberId::persisted(update.uid.clone());
                let mut member = session
                    .member(&id)
                    .cloned()
                    .ok_or_else(|| format!("unknown member {}", update.uid))?;
                fill_member(&mut member, update.spec);
                session.update_member(member);
            }
            for uid in removals {
                let id = MemberId::persisted(uid.clone());
                let removed = session.remove_member(&id, &mut |prompt: &str| {
                    println!("{prompt} yes");
                    true
                });
                if !removed {
                    return Err(format!("unknown member {uid}"));
                }
            }
            for spec in members {
                add_member(&mut session, spec);
            }
            save(gateway, &mut session).await?;
        }
    }
    Ok(())
}

fn fill_member(member: &mut Member, spec: MemberSpec) {
    member.family_name = spec.family_name;
    member.given_name = spec.given_name;
    member.birthday = spec.birthday;
    member.relationship = spec.relationship;
}

fn add_member(session: &mut EditSession, spec: MemberSpec) {
    let id = session.add_member();
    if let Some(mut member) = session.member(&id).cloned() {
        fill_member(&mut member, spec);
        session.update_member(member);
    }
}

async fn save(gateway: HttpGateway, session: &mut EditSession) -> Result<(), String> {
    let orchestrator = SaveOrchestrator::new(gateway);
    let outcome = orchestrator.save(session).await;
    if let Some(report) = outcome.report() {
        for op in &report.operations {
            match &op.result {
                Ok(()) => println!("{}\tok", op.operation.name()),
                Err(err) => println!("{}\terror\t{err}", op.operation.name()),
            }
        }
    }
    match outcome {
        SaveOutcome::Saved(_) => {
            println!("saved household={}", session.household_id().unwrap_or("-"));
            for member in session.members() {
                println!("member {}\t{} {}", member.id, member.family_name, member.given_name);
            }
            Ok(())
        }
        SaveOutcome::Rejected(rejection) => Err(format!("save rejected: {rejection}")),
        SaveOutcome::Failed(report) => Err(format!(
            "save failed: {} operation(s) failed; run again to retry",
            report.failures().count()
        )),
        SaveOutcome::Unreconciled { error, .. } => Err(format!("save unreconciled: {error}")),
    }
}

fn connect(base_url: Option<&str>) -> Result<HttpGateway, String> {
    let config = GatewayConfig::resolve(base_url).map_err(|err| err.to_string())?;
    HttpGateway::new(&config).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, MemberSpec, MemberUpdate};
    use clap::Parser;
    use household_core::Relationship;

    #[test]
    fn member_spec_accepts_label_or_name() {
        let spec: MemberSpec = "山田, 太郎, 1990-01-21, 本人".parse().unwrap();
        assert_eq!(spec.family_name, "山田");
        assert_eq!(spec.birthday, "1990-01-21");
        assert_eq!(spec.relationship, Some(Relationship::Head));

        let spec: MemberSpec = "山田,花子,1991-02-02,spouse".parse().unwrap();
        assert_eq!(spec.relationship, Some(Relationship::Spouse));

        let unset: MemberSpec = "山田,次郎,2001-03-03,".parse().unwrap();
        assert_eq!(unset.relationship, None);
    }

    #[test]
    fn member_spec_rejects_wrong_shape() {
        assert!("山田,太郎".parse::<MemberSpec>().is_err());
        assert!("山田,太郎,1990-01-21,friend".parse::<MemberSpec>().is_err());
        assert!(":山田,太郎,1990-01-21,本人".parse::<MemberUpdate>().is_err());
    }

    #[test]
    fn edit_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "household",
            "edit",
            "H1",
            "--email",
            "a@b.co",
            "--member",
            "山田,一郎,2010-05-05,子",
            "--update",
            "M1:山田,太郎,1990-01-21,本人",
            "--remove",
            "M2",
            "--remove",
            "M3",
        ])
        .unwrap();
        let Command::Edit {
            household_uid,
            fields,
            members,
            updates,
            removals,
        } = cli.command
        else {
            panic!("expected edit");
        };
        assert_eq!(household_uid, "H1");
        assert_eq!(fields.email.as_deref(), Some("a@b.co"));
        assert_eq!(fields.phone_number, None);
        assert_eq!(members.len(), 1);
        assert_eq!(updates[0].uid, "M1");
        assert_eq!(removals, vec!["M2".to_string(), "M3".to_string()]);
    }
}
