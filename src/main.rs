use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;

use parasync::config::{AppDirs, Profile, ProfileStore};
use parasync::logging::{self, error, info};
use parasync::progress::{drain_to_log, CancelFlag, Outcome, Reporter};
use parasync::runner::ActiveOps;
use parasync::transport::ProcessTransport;
use parasync::{bootstrap, discover, listing, strategies, watch};

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_PROFILE_NOT_FOUND: i32 = 2;
const EXIT_MISSING_PATH: i32 = 3;

fn profile_name_arg() -> Arg {
	Arg::new("name").short('n').long("name").value_name("NAME").required(true).help("Profile name")
}

fn build_cli() -> Command {
	Command::new("parasync")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Push/pull/merge files between two machines over SSH")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.long("config")
				.value_name("FILE")
				.help("Path to config.json (default: ~/.parasync/config.json)"),
		)
		.subcommand(
			Command::new("profile-add")
				.about("Add or update a profile")
				.arg(profile_name_arg())
				.arg(Arg::new("host").long("host").required(true))
				.arg(Arg::new("user").long("user").required(true))
				.arg(
					Arg::new("port")
						.long("port")
						.value_parser(clap::value_parser!(u16))
						.default_value("22"),
				)
				.arg(Arg::new("local").long("local").default_value(""))
				.arg(Arg::new("remote").long("remote").default_value(""))
				.arg(Arg::new("identity").long("identity").default_value(""))
				.arg(
					Arg::new("no-ensure-remote-dir")
						.long("no-ensure-remote-dir")
						.action(ArgAction::SetTrue)
						.help("Do not create the remote directory before a push"),
				),
		)
		.subcommand(Command::new("profile-del").about("Delete a profile").arg(profile_name_arg()))
		.subcommand(Command::new("profile-list").about("List profiles"))
		.subcommand(Command::new("test").about("Test SSH connectivity").arg(profile_name_arg()))
		.subcommand(
			Command::new("setup")
				.about("Generate, install and verify a passwordless SSH key")
				.arg(profile_name_arg()),
		)
		.subcommand(
			Command::new("push")
				.about("Mirror local -> remote (old remote contents go to the remote trash)")
				.arg(profile_name_arg())
				.arg(Arg::new("local").long("local").help("Override the profile's local path"))
				.arg(Arg::new("remote").long("remote").help("Override the profile's remote path")),
		)
		.subcommand(
			Command::new("pull")
				.about("Mirror remote -> local (old local contents go to the local trash)")
				.arg(profile_name_arg())
				.arg(Arg::new("local").long("local").help("Override the profile's local path"))
				.arg(Arg::new("remote").long("remote").help("Override the profile's remote path")),
		)
		.subcommand(
			Command::new("diff")
				.about("Preview a push: entries to copy (+), displace (-) and overwrite (~)")
				.arg(profile_name_arg())
				.arg(Arg::new("local").long("local").help("Override the profile's local path"))
				.arg(Arg::new("remote").long("remote").help("Override the profile's remote path")),
		)
		.subcommand(
			Command::new("sync")
				.about("Two-way merge: copy missing files both ways, delete nothing")
				.arg(profile_name_arg()),
		)
		.subcommand(
			Command::new("ls-remote")
				.about("List the remote directory of a profile")
				.arg(profile_name_arg()),
		)
		.subcommand(
			Command::new("watch")
				.about("Watch the local path and auto-push after a quiet period")
				.arg(profile_name_arg()),
		)
		.subcommand(
			Command::new("scan").about("Scan a subnet for an SSH host").arg(
				Arg::new("subnet")
					.long("subnet")
					.default_value(discover::DEFAULT_SUBNET)
					.help("First three octets, e.g. 10.211.55"),
			),
		)
}

/// Cancel flag wired to Ctrl-C; transport calls are not preemptible, so
/// cancellation takes effect at the next entry boundary.
fn cancel_on_ctrl_c() -> CancelFlag {
	let flag = CancelFlag::new();
	let handle = flag.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("Interrupt received; stopping after the current entry");
			handle.cancel();
		}
	});
	flag
}

fn apply_overrides(profile: &mut Profile, matches: &ArgMatches) {
	if let Some(local) = matches.get_one::<String>("local") {
		profile.local_path = local.clone();
	}
	if let Some(remote) = matches.get_one::<String>("remote") {
		profile.remote_path = remote.clone();
	}
}

fn report(outcome: &Outcome) -> i32 {
	if outcome.success {
		info!("{}", outcome.message);
		EXIT_OK
	} else {
		error!("{}", outcome.message);
		EXIT_FAILURE
	}
}

async fn run() -> i32 {
	let matches = build_cli().get_matches();

	let dirs = match AppDirs::resolve() {
		Ok(dirs) => dirs,
		Err(e) => {
			error!("{}", e);
			return EXIT_FAILURE;
		}
	};
	let config_path = matches
		.get_one::<String>("config")
		.map(PathBuf::from)
		.unwrap_or_else(|| dirs.config_path.clone());

	let mut store = match ProfileStore::load(&config_path) {
		Ok(store) => store,
		Err(e) => {
			error!("{}", e);
			return EXIT_FAILURE;
		}
	};

	match matches.subcommand() {
		Some(("profile-add", sub)) => {
			let profile = Profile {
				name: sub.get_one::<String>("name").cloned().unwrap_or_default(),
				host: sub.get_one::<String>("host").cloned().unwrap_or_default(),
				user: sub.get_one::<String>("user").cloned().unwrap_or_default(),
				port: *sub.get_one::<u16>("port").unwrap_or(&22),
				local_path: sub.get_one::<String>("local").cloned().unwrap_or_default(),
				remote_path: sub.get_one::<String>("remote").cloned().unwrap_or_default(),
				identity_file: sub.get_one::<String>("identity").cloned().unwrap_or_default(),
				ensure_remote_dir: !sub.get_flag("no-ensure-remote-dir"),
			};
			let name = profile.name.clone();
			if let Err(e) = store.upsert(profile).and_then(|_| store.save()) {
				error!("{}", e);
				return EXIT_FAILURE;
			}
			info!("Saved profile '{}' to {}", name, config_path.display());
			EXIT_OK
		}
		Some(("profile-del", sub)) => {
			let name = sub.get_one::<String>("name").cloned().unwrap_or_default();
			let removed = store.delete(&name);
			if let Err(e) = store.save() {
				error!("{}", e);
				return EXIT_FAILURE;
			}
			if removed {
				info!("Deleted profile '{}'", name);
				EXIT_OK
			} else {
				error!("Profile not found: {}", name);
				EXIT_PROFILE_NOT_FOUND
			}
		}
		Some(("profile-list", _)) => {
			if store.profiles().is_empty() {
				println!("No profiles.");
				return EXIT_OK;
			}
			for p in store.profiles() {
				let ident = if p.identity_file.is_empty() { "(default)" } else { &p.identity_file };
				println!(
					"- {}: {}@{}:{}  local='{}'  remote='{}'  key={}",
					p.name, p.user, p.host, p.port, p.local_path, p.remote_path, ident
				);
			}
			EXIT_OK
		}
		Some(("scan", sub)) => {
			let subnet = sub.get_one::<String>("subnet").cloned().unwrap_or_default();
			info!("Scanning {}.0/24 for an SSH host...", subnet);
			match discover::scan_for_ssh_host(&subnet).await {
				Some(addr) => {
					println!("{}", addr);
					EXIT_OK
				}
				None => {
					error!("No SSH host found on {}.0/24. Is remote login enabled?", subnet);
					EXIT_FAILURE
				}
			}
		}
		Some((cmd, sub)) => {
			// All remaining subcommands resolve a profile first
			let name = sub.get_one::<String>("name").cloned().unwrap_or_default();
			let mut profile = match store.get(&name) {
				Some(p) => p.clone(),
				None => {
					error!("Profile not found: {}", name);
					return EXIT_PROFILE_NOT_FOUND;
				}
			};

			match cmd {
				"test" => {
					let (reporter, events) = Reporter::channel();
					let drain = drain_to_log(events);
					let outcome =
						strategies::test_connection(&ProcessTransport, &profile, &reporter).await;
					drop(reporter);
					let _ = drain.await;
					report(&outcome)
				}
				"setup" => {
					let (reporter, events) = Reporter::channel();
					let drain = drain_to_log(events);
					let outcome =
						bootstrap::setup_passwordless(&ProcessTransport, &profile, &dirs, &reporter)
							.await;
					drop(reporter);
					let _ = drain.await;
					report(&outcome)
				}
				"push" | "pull" | "sync" => {
					if cmd != "sync" {
						apply_overrides(&mut profile, sub);
					}
					if profile.local_path.is_empty() || profile.remote_path.is_empty() {
						error!(
							"Missing --local/--remote (or set local_path/remote_path in the profile)"
						);
						return EXIT_MISSING_PATH;
					}
					let (reporter, events) = Reporter::channel();
					let drain = drain_to_log(events);
					let outcome = match cmd {
						"push" => {
							let cancel = cancel_on_ctrl_c();
							strategies::mirror_push(&ProcessTransport, &profile, &reporter, &cancel)
								.await
						}
						"pull" => {
							strategies::mirror_pull(
								&ProcessTransport,
								&profile,
								&dirs.trash_dir,
								&reporter,
							)
							.await
						}
						_ => {
							let cancel = cancel_on_ctrl_c();
							strategies::two_way_merge(
								&ProcessTransport,
								&profile,
								&reporter,
								&cancel,
							)
							.await
						}
					};
					drop(reporter);
					let _ = drain.await;
					report(&outcome)
				}
				"diff" => {
					apply_overrides(&mut profile, sub);
					if profile.local_path.is_empty() || profile.remote_path.is_empty() {
						error!(
							"Missing --local/--remote (or set local_path/remote_path in the profile)"
						);
						return EXIT_MISSING_PATH;
					}
					match strategies::preview_diff(&ProcessTransport, &profile).await {
						Ok(d) => {
							if d.is_empty() {
								println!("No differences.");
								return EXIT_OK;
							}
							for name in &d.to_add {
								println!("+ {}", name);
							}
							for name in &d.to_delete {
								println!("- {}", name);
							}
							for name in &d.to_overwrite {
								println!("~ {}", name);
							}
							EXIT_OK
						}
						Err(e) => {
							error!("{}", e);
							EXIT_FAILURE
						}
					}
				}
				"ls-remote" => {
					if profile.remote_path.is_empty() {
						error!("Profile has no remote_path");
						return EXIT_MISSING_PATH;
					}
					match listing::remote_entries(&ProcessTransport, &profile, &profile.remote_path)
						.await
					{
						Ok(names) => {
							for name in names {
								println!("{}", name);
							}
							EXIT_OK
						}
						Err(e) => {
							error!("{}", e);
							EXIT_FAILURE
						}
					}
				}
				"watch" => {
					if profile.local_path.is_empty() || profile.remote_path.is_empty() {
						error!("Profile needs both local_path and remote_path for watch");
						return EXIT_MISSING_PATH;
					}
					let ops = ActiveOps::new();
					match watch::watch_and_push(Arc::new(ProcessTransport), profile, ops).await {
						Ok(()) => EXIT_OK,
						Err(e) => {
							error!("{}", e);
							EXIT_FAILURE
						}
					}
				}
				_ => {
					error!("Unknown command");
					EXIT_FAILURE
				}
			}
		}
		None => EXIT_FAILURE,
	}
}

#[tokio::main]
async fn main() {
	logging::init_tracing();
	std::process::exit(run().await);
}

// vim: ts=4
