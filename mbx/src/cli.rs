use clap;

pub fn parse_flags<'a>() -> clap::ArgMatches<'a> {
    clap::App::new("mbx")
        .version(clap::crate_version!())
        .about("Extract the SMS and call history databases from an encrypted MobileSync backup")
        .arg(clap::Arg::from_usage("-d --debug 'Enable debug output'"))
        .arg(clap::Arg::from_usage(
            "--password [password] 'Backup password (prompted interactively when omitted)'",
        ))
        .get_matches()
}
