#[cfg(feature = "tracing_debug")]
use tracing::debug;

use crate::constant::ARGS_KEY;
use crate::matcher::model::*;
use crate::model::{Arguments, Parsed, State, Value};
use crate::parser::ParseError;
use crate::signature::ArgumentSignature;

/// A parse failure, with the offset of the token being processed when it occurred.
pub(crate) type MatchFailure = (usize, ParseError);

// An option, along with the index of the scope it was found in.
type Scoped<'r> = (usize, &'r OptionNode);

#[derive(Debug)]
enum OptionMatch<'r> {
    Known {
        option: Scoped<'r>,
        inline: Option<String>,
    },
    Negated(Scoped<'r>),
    Cluster {
        options: Vec<Scoped<'r>>,
        inline: Option<String>,
    },
}

#[derive(Debug)]
struct Write {
    scope: usize,
    name: String,
    value: Value,
}

// The per-call parse state.
struct Pass<'t, 'r> {
    tokens: &'t [String],
    cursor: usize,
    arguments: Vec<String>,
    state: State,
    // The command which claimed this parse.
    command: Option<&'r CommandNode>,
}

/// Walks the tokens against a root [`Registry`].
/// Holds no parse state of its own, so one matcher may serve any number of parses.
pub(crate) struct Matcher<'r> {
    root: &'r Registry,
    strict: bool,
}

impl<'r> Matcher<'r> {
    pub(crate) fn new(root: &'r Registry, strict: bool) -> Self {
        Self { root, strict }
    }

    pub(crate) fn run(&self, tokens: &[String], state: State) -> Result<Parsed, MatchFailure> {
        self.walk(tokens, state).map(|(parsed, _)| parsed)
    }

    /// As [`Matcher::run`], also returning the command that ran (if any).
    pub(crate) fn walk(
        &self,
        tokens: &[String],
        state: State,
    ) -> Result<(Parsed, Option<&'r CommandNode>), MatchFailure> {
        let mut pass = Pass {
            tokens,
            cursor: 0,
            arguments: Vec::default(),
            state,
            command: None,
        };

        while pass.cursor < tokens.len() {
            if let Err(error) = self.step(&mut pass) {
                return Err((pass.cursor, error));
            }

            pass.cursor += 1;
        }

        Ok((
            Parsed {
                arguments: pass.arguments,
                state: pass.state,
            },
            pass.command,
        ))
    }

    // Dispatch the token at the cursor, leaving the cursor on the final token consumed.
    fn step(&self, pass: &mut Pass<'_, 'r>) -> Result<(), ParseError> {
        let tokens = pass.tokens;
        let token = &tokens[pass.cursor];
        let scopes = [self.root];

        if let Some(found) = resolve(&scopes, token)? {
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Token '{token}' matched {found:?}.");
            }

            for write in self.dispatch(pass, &scopes, found)? {
                pass.state.insert(write.name, write.value);
            }

            return Ok(());
        }

        if let Some(command) = self.root.find_command(token) {
            if pass.command.is_none() {
                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Token '{token}' matched command '{}'.", command.name);
                }

                return self.run_command(pass, command);
            }

            #[cfg(feature = "tracing_debug")]
            {
                debug!("Token '{token}' names a command, but a command already ran.");
            }
        }

        if self.strict && is_option_shaped(token) {
            return Err(missing_option(token));
        }

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Token '{token}' is a plain argument.");
        }

        pass.arguments.push(token.clone());
        Ok(())
    }

    fn dispatch(
        &self,
        pass: &mut Pass,
        scopes: &[&Registry],
        found: OptionMatch,
    ) -> Result<Vec<Write>, ParseError> {
        let mut writes = Vec::default();

        match found {
            OptionMatch::Known {
                option: (scope, option),
                inline,
            } => {
                let values = self.option_values(pass, scopes, option, inline)?;
                writes.extend(deliver(scope, option, values));
            }
            OptionMatch::Negated((scope, option)) => {
                writes.extend(deliver(scope, option, vec![Value::Bool(false)]));
            }
            OptionMatch::Cluster { options, inline } => {
                let last = options.len() - 1;

                for (index, (scope, option)) in options.into_iter().enumerate() {
                    if index == last {
                        let values = self.option_values(pass, scopes, option, inline)?;
                        writes.extend(deliver(scope, option, values));
                        break;
                    }

                    // Only the final option of a cluster may receive arguments.
                    if option.signature.min_arity() > 0 {
                        return Err(ParseError::missing_argument(
                            &option.name,
                            &[],
                            &option.signature,
                        ));
                    }

                    let values = if option.takes_arguments() {
                        resolve_signature(&option.name, &option.signature, &[])?
                    } else {
                        vec![Value::Bool(true)]
                    };
                    writes.extend(deliver(scope, option, values));
                }
            }
        }

        Ok(writes)
    }

    fn option_values(
        &self,
        pass: &mut Pass,
        scopes: &[&Registry],
        option: &OptionNode,
        inline: Option<String>,
    ) -> Result<Vec<Value>, ParseError> {
        if !option.takes_arguments() {
            return match inline {
                Some(value) => Err(ParseError::missing_argument(
                    &option.name,
                    &[value],
                    &option.signature,
                )),
                None => Ok(vec![Value::Bool(true)]),
            };
        }

        // Options using k=v syntax cannot follow up with more values afterwards.
        let collected = match inline {
            Some(value) => vec![value],
            None => collect(pass, scopes, &option.signature, self.strict)?,
        };

        resolve_signature(&option.name, &option.signature, &collected)
    }

    fn run_command(
        &self,
        pass: &mut Pass<'_, 'r>,
        command: &'r CommandNode,
    ) -> Result<(), ParseError> {
        pass.command.replace(command);
        let registry = command.registry()?;
        let scopes = [registry, self.root];
        let tokens = pass.tokens;
        let mut nested = pass
            .state
            .command(&command.name)
            .cloned()
            .unwrap_or_default();
        let mut positional: Vec<String> = Vec::default();

        while let Some(token) = tokens.get(pass.cursor + 1) {
            match resolve(&scopes, token)? {
                Some(found) => {
                    #[cfg(feature = "tracing_debug")]
                    {
                        debug!("Token '{token}' matched {found:?} within '{}'.", command.name);
                    }

                    pass.cursor += 1;

                    for write in self.dispatch(pass, &scopes, found)? {
                        if write.scope == 0 {
                            nested.insert(write.name, write.value);
                        } else {
                            pass.state.insert(write.name, write.value);
                        }
                    }
                }
                None => {
                    if self.strict && is_option_shaped(token) {
                        pass.cursor += 1;
                        return Err(missing_option(token));
                    }

                    positional.push(token.clone());

                    if !command.signature.is_possible(&positional) {
                        positional.pop();
                        #[cfg(feature = "tracing_debug")]
                        {
                            debug!("Token '{token}' ends the arguments of '{}'.", command.name);
                        }
                        break;
                    }

                    pass.cursor += 1;
                }
            }
        }

        let values = resolve_signature(&command.name, &command.signature, &positional)?;

        match &command.callback {
            Some(callback) => callback(&named(&command.signature, values)),
            None => nested.insert(ARGS_KEY, Value::List(values)),
        }

        pass.state.insert(command.name.clone(), Value::Map(nested));
        Ok(())
    }
}

// Greedily take the tokens following the cursor, while they remain possible for the signature.
// Under strict mode an unresolved option-shaped token is an error rather than a value.
fn collect(
    pass: &mut Pass,
    scopes: &[&Registry],
    signature: &ArgumentSignature,
    strict: bool,
) -> Result<Vec<String>, ParseError> {
    let tokens = pass.tokens;
    let mut collected = Vec::default();

    while let Some(token) = tokens.get(pass.cursor + 1) {
        if let Some(max) = signature.max_arity() {
            if collected.len() >= max {
                break;
            }
        }

        if !matches!(resolve(scopes, token), Ok(None)) {
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Collection stopped at the option '{token}'.");
            }
            break;
        }

        if strict && is_option_shaped(token) {
            pass.cursor += 1;
            return Err(missing_option(token));
        }

        collected.push(token.clone());

        if !signature.is_possible(&collected) {
            collected.pop();
            #[cfg(feature = "tracing_debug")]
            {
                debug!("Collection stopped at the impossible token '{token}'.");
            }
            break;
        }

        pass.cursor += 1;
    }

    Ok(collected)
}

fn missing_option(token: &str) -> ParseError {
    let (name, _) = split_equals_delimiter(token);
    ParseError::MissingOption(name.to_string())
}

fn resolve_signature(
    name: &str,
    signature: &ArgumentSignature,
    tokens: &[String],
) -> Result<Vec<Value>, ParseError> {
    signature
        .resolve(tokens)
        .map_err(|_| ParseError::missing_argument(name, tokens, signature))
}

fn named(signature: &ArgumentSignature, values: Vec<Value>) -> Arguments {
    Arguments::new(
        signature
            .slots()
            .iter()
            .map(|slot| slot.name().to_string())
            .zip(values)
            .collect(),
    )
}

// Run the option's callback, or produce the write into its scope's state.
fn deliver(scope: usize, option: &OptionNode, mut values: Vec<Value>) -> Option<Write> {
    match &option.callback {
        Some(callback) => {
            let arguments = if option.takes_arguments() {
                named(&option.signature, values)
            } else {
                Arguments::new(
                    values
                        .into_iter()
                        .map(|value| (option.name.clone(), value))
                        .collect(),
                )
            };
            callback(&arguments);
            None
        }
        None => {
            let value = if values.len() <= 1 {
                values.pop().unwrap_or(Value::Null)
            } else {
                Value::List(values)
            };

            Some(Write {
                scope,
                name: option.name.clone(),
                value,
            })
        }
    }
}

fn find_long<'r>(scopes: &[&'r Registry], long: &str) -> Option<Scoped<'r>> {
    scopes
        .iter()
        .enumerate()
        .find_map(|(index, registry)| registry.find_long(long).map(|option| (index, option)))
}

fn find_negated<'r>(scopes: &[&'r Registry], long: &str) -> Option<Scoped<'r>> {
    scopes
        .iter()
        .enumerate()
        .find_map(|(index, registry)| registry.find_negated(long).map(|option| (index, option)))
}

fn find_short<'r>(scopes: &[&'r Registry], short: char) -> Option<Scoped<'r>> {
    scopes
        .iter()
        .enumerate()
        .find_map(|(index, registry)| registry.find_short(short).map(|option| (index, option)))
}

// Resolve an option-shaped token, searching the scopes innermost first.
// 1. A long option, such as:
//  --initial
//  --initial=..
// 2. A negated bool, such as:
//  --no-initial
// 3. A short option or cluster of short options, such as (both -i and -v are example short options):
//  -i
//  -i=..
//  -iv
//  -iv=..
fn resolve<'r>(scopes: &[&'r Registry], token: &str) -> Result<Option<OptionMatch<'r>>, ParseError> {
    if let Some(body) = token.strip_prefix("--") {
        let (name, inline) = split_equals_delimiter(body);

        if name.is_empty() {
            return Ok(None);
        }

        if let Some(option) = find_long(scopes, name) {
            return Ok(Some(OptionMatch::Known {
                option,
                inline: inline.map(str::to_string),
            }));
        }

        if inline.is_none() {
            if let Some(option) = find_negated(scopes, name) {
                return Ok(Some(OptionMatch::Negated(option)));
            }
        }

        Ok(None)
    } else if let Some(body) = token.strip_prefix('-') {
        let (shorts, inline) = split_equals_delimiter(body);
        let mut chars = shorts.chars();
        let head = match chars.next().and_then(|single| find_short(scopes, single)) {
            Some(head) => head,
            None => return Ok(None),
        };
        let inline = inline.map(str::to_string);

        if chars.as_str().is_empty() {
            return Ok(Some(OptionMatch::Known {
                option: head,
                inline,
            }));
        }

        let mut options = vec![head];

        for single in chars {
            match find_short(scopes, single) {
                Some(option) => options.push(option),
                None => return Err(ParseError::MissingOption(format!("-{single}"))),
            }
        }

        Ok(Some(OptionMatch::Cluster { options, inline }))
    } else {
        Ok(None)
    }
}

fn split_equals_delimiter(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (token, None),
    }
}

// Numbers (ex: "-5") and the bare "--" are never treated as option references.
fn is_option_shaped(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-') && token != "--" && token.parse::<f64>().is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{float, integer, range_type, Command, CommandScope, Opt, TypeRegistry};
    use crate::signature::ArgumentSlot;
    use crate::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use rstest::rstest;

    fn scope() -> CommandScope {
        CommandScope::new(Arc::new(TypeRegistry::default()))
    }

    fn tokens(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn run(registry: &Registry, input: &[&str]) -> Result<Parsed, MatchFailure> {
        Matcher::new(registry, false).run(&tokens(input), State::default())
    }

    fn cluster_registry() -> Registry {
        scope()
            .add(Opt::switch("verbose").short('v'))
            .add(Opt::switch("all").short('a'))
            .add(Opt::flag("scale").short('s').kind(float()))
            .build()
            .unwrap()
    }

    #[test]
    fn cluster_final_takes_argument() {
        let registry = cluster_registry();
        let parsed = run(&registry, &["-vas", "2.45"]).unwrap();

        assert_eq!(parsed.state.get("verbose"), Some(&Value::Bool(true)));
        assert_eq!(parsed.state.get("all"), Some(&Value::Bool(true)));
        assert_eq!(parsed.state.get("scale"), Some(&Value::Float(2.45)));
        assert!(parsed.arguments.is_empty());
    }

    #[test]
    fn cluster_interior_argument() {
        let registry = cluster_registry();
        let (offset, error) = run(&registry, &["-vsa", "2.45"]).unwrap_err();

        assert_eq!(offset, 0);
        assert_matches!(error, ParseError::MissingArgument { node, supplied, .. } => {
            assert_eq!(node, "scale");
            assert!(supplied.is_empty());
        });
    }

    #[test]
    fn cluster_matches_standalone() {
        let registry = cluster_registry();
        let clustered = run(&registry, &["-av"]).unwrap();
        let standalone = run(&registry, &["--all", "--verbose"]).unwrap();

        assert_eq!(clustered.state.get("verbose"), standalone.state.get("verbose"));
        assert_eq!(clustered.state.get("all"), standalone.state.get("all"));
    }

    #[test]
    fn cluster_unknown() {
        let registry = cluster_registry();
        let (_, error) = run(&registry, &["-vx"]).unwrap_err();
        assert_eq!(error, ParseError::MissingOption("-x".to_string()));
    }

    #[test]
    fn cluster_unknown_head() {
        // Without a declared head, the token is not a cluster.
        let registry = cluster_registry();
        let parsed = run(&registry, &["-xv"]).unwrap();
        assert_eq!(parsed.arguments, tokens(&["-xv"]));
    }

    #[test]
    fn cluster_inline() {
        let registry = cluster_registry();
        let parsed = run(&registry, &["-vs=0.5"]).unwrap();
        assert_eq!(parsed.state.get("verbose"), Some(&Value::Bool(true)));
        assert_eq!(parsed.state.get("scale"), Some(&Value::Float(0.5)));
    }

    #[rstest]
    #[case(vec!["--verbose"], Some(true))]
    #[case(vec!["-v"], Some(true))]
    #[case(vec!["--no-verbose"], Some(false))]
    #[case(vec!["--no_verbose"], Some(false))]
    #[case(vec!["--verbose", "--no-verbose"], Some(false))]
    #[case(vec!["--no-verbose", "-v"], Some(true))]
    #[case(vec![], None)]
    fn bool_negation(#[case] input: Vec<&str>, #[case] expected: Option<bool>) {
        let registry = scope()
            .add(Opt::boolean("verbose").short('v'))
            .build()
            .unwrap();
        let parsed = run(&registry, &input).unwrap();

        assert_eq!(parsed.state.get("verbose"), expected.map(Value::Bool).as_ref());
        assert!(parsed.arguments.is_empty());
    }

    #[test]
    fn negation_requires_bool() {
        let registry = scope()
            .add(Opt::switch("verbose"))
            .build()
            .unwrap();
        let parsed = run(&registry, &["--no-verbose", "--no-colour"]).unwrap();

        assert!(parsed.state.is_empty());
        assert_eq!(parsed.arguments, tokens(&["--no-verbose", "--no-colour"]));
    }

    #[rstest]
    #[case("--no-colour")]
    #[case("--colour")]
    #[case("-c")]
    #[case("--colour=red")]
    fn strict_unknown(#[case] token: &str) {
        let registry = scope().add(Opt::boolean("verbose")).build().unwrap();
        let (_, error) = Matcher::new(&registry, true)
            .run(&tokens(&[token]), State::default())
            .unwrap_err();
        assert_matches!(error, ParseError::MissingOption(_));
    }

    #[rstest]
    #[case("-5")]
    #[case("-2.5")]
    #[case("--")]
    #[case("plain")]
    fn strict_plain(#[case] token: &str) {
        let registry = scope().add(Opt::boolean("verbose")).build().unwrap();
        let parsed = Matcher::new(&registry, true)
            .run(&tokens(&[token]), State::default())
            .unwrap();
        assert_eq!(parsed.arguments, tokens(&[token]));
    }

    #[rstest]
    #[case(vec!["--out", "--bogus"], 1, "--bogus")]
    #[case(vec!["--out", "-x=1"], 1, "-x")]
    #[case(vec!["--many", "a", "--bogus", "b"], 2, "--bogus")]
    #[case(vec!["build", "--bogus"], 1, "--bogus")]
    #[case(vec!["build", "app", "--no-bogus"], 2, "--no-bogus")]
    fn strict_argument_window(
        #[case] input: Vec<&str>,
        #[case] offset: usize,
        #[case] name: &str,
    ) {
        let registry = scope()
            .add(Opt::flag("out"))
            .add(Opt::flag("many").args("<item>..."))
            .command(Command::new("build").args("[<target>...]"))
            .build()
            .unwrap();

        let failure = Matcher::new(&registry, true)
            .run(&tokens(&input), State::default())
            .unwrap_err();
        assert_eq!(failure, (offset, ParseError::MissingOption(name.to_string())));

        // Without strict mode, the token is an argument.
        assert!(run(&registry, &input).is_ok());
    }

    #[test]
    fn strict_argument_numbers() {
        let registry = scope()
            .add(Opt::flag("offset").kind(integer()))
            .command(Command::new("shift").args("<by>"))
            .build()
            .unwrap();
        let parsed = Matcher::new(&registry, true)
            .run(&tokens(&["--offset", "-3", "shift", "-2"]), State::default())
            .unwrap();

        assert_eq!(parsed.state.get("offset"), Some(&Value::Integer(-3)));
        assert_eq!(
            parsed.state.command("shift").unwrap().get(ARGS_KEY),
            Some(&Value::from(vec!["-2"]))
        );
    }

    #[test]
    fn flag_range_overflow() {
        let registry = scope().add(Opt::flag("span").kind(range_type())).build().unwrap();

        let (_, error) = run(&registry, &["--span", "0...-9223372036854775808"]).unwrap_err();
        assert_matches!(error, ParseError::MissingArgument { node, .. } if node == "span");
        let parsed = run(&registry, &["--span", "0...5"]).unwrap();
        assert_eq!(parsed.state.get("span"), Some(&Value::Range(0, 4)));
    }

    #[test]
    fn walk_reports_command() {
        let registry = command_registry("[<target>]");
        let matcher = Matcher::new(&registry, false);

        let (_, command) = matcher.walk(&tokens(&["-v", "build", "x"]), State::default()).unwrap();
        assert_eq!(command.map(|c| c.name.as_str()), Some("build"));
        let (_, command) = matcher.walk(&tokens(&["-v", "x"]), State::default()).unwrap();
        assert!(command.is_none());
    }

    #[rstest]
    #[case(vec!["--auto-build", "x"])]
    #[case(vec!["--auto_build", "x"])]
    #[case(vec!["--auto-build=x"])]
    fn long_dash_underscore(#[case] input: Vec<&str>) {
        let registry = scope().add(Opt::flag("auto_build")).build().unwrap();
        let parsed = run(&registry, &input).unwrap();
        assert_eq!(parsed.state.get("auto_build"), Some(&Value::from("x")));
    }

    #[rstest]
    #[case(vec!["--size", "3"], Value::Integer(3), vec![])]
    #[case(vec!["--size=3"], Value::Integer(3), vec![])]
    #[case(vec!["-s", "3"], Value::Integer(3), vec![])]
    #[case(vec!["-s=3", "4"], Value::Integer(3), vec!["4"])]
    #[case(vec!["--size", "-3"], Value::Integer(-3), vec![])]
    #[case(vec!["--size", "3", "4"], Value::Integer(3), vec!["4"])]
    #[case(vec!["a", "--size", "3", "b"], Value::Integer(3), vec!["a", "b"])]
    fn flag_single(
        #[case] input: Vec<&str>,
        #[case] expected: Value,
        #[case] arguments: Vec<&str>,
    ) {
        let registry = scope()
            .add(Opt::flag("size").short('s').kind(integer()))
            .build()
            .unwrap();
        let parsed = run(&registry, &input).unwrap();

        assert_eq!(parsed.state.get("size"), Some(&expected));
        assert_eq!(parsed.arguments, tokens(&arguments));
    }

    #[rstest]
    #[case(vec!["--size"])]
    #[case(vec!["--size", "three"])]
    #[case(vec!["--size", "-v"])]
    #[case(vec!["--size="])]
    fn flag_missing(#[case] input: Vec<&str>) {
        let registry = scope()
            .add(Opt::flag("size").kind(integer()))
            .add(Opt::switch("verbose").short('v'))
            .build()
            .unwrap();
        let (offset, error) = run(&registry, &input).unwrap_err();

        assert_eq!(offset, 0);
        assert_matches!(error, ParseError::MissingArgument { node, .. } if node == "size");
    }

    #[test]
    fn switch_inline_value() {
        let registry = scope().add(Opt::switch("verbose")).build().unwrap();
        let (_, error) = run(&registry, &["--verbose=yes"]).unwrap_err();
        assert_matches!(error, ParseError::MissingArgument { supplied, .. } if supplied == vec!["yes".to_string()]);
    }

    #[test]
    fn flag_multiple() {
        let registry = scope()
            .add(Opt::flag("size").args("<width> [<height>]").kind(integer()))
            .build()
            .unwrap();

        let parsed = run(&registry, &["--size", "3", "4", "5"]).unwrap();
        assert_eq!(
            parsed.state.get("size"),
            Some(&Value::List(vec![Value::Integer(3), Value::Integer(4)]))
        );
        assert_eq!(parsed.arguments, tokens(&["5"]));

        let parsed = run(&registry, &["--size", "3", "x"]).unwrap();
        assert_eq!(
            parsed.state.get("size"),
            Some(&Value::List(vec![Value::Integer(3), Value::Null]))
        );
        assert_eq!(parsed.arguments, tokens(&["x"]));
    }

    #[test]
    fn flag_splat_stops_at_option() {
        let registry = scope()
            .add(Opt::flag("files").args("<files>..."))
            .add(Opt::switch("verbose").short('v'))
            .build()
            .unwrap();
        let parsed = run(&registry, &["--files", "a", "b", "-v", "c"]).unwrap();

        assert_eq!(
            parsed.state.get("files"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(parsed.state.get("verbose"), Some(&Value::Bool(true)));
        assert_eq!(parsed.arguments, tokens(&["c"]));
    }

    #[test]
    fn flag_choices() {
        let registry = scope()
            .add(Opt::flag("mode").choices(vec!["fast", "slow"]))
            .build()
            .unwrap();

        let parsed = run(&registry, &["--mode", "slow"]).unwrap();
        assert_eq!(parsed.state.get("mode"), Some(&Value::from("slow")));

        let (_, error) = run(&registry, &["--mode", "medium"]).unwrap_err();
        assert_matches!(error, ParseError::MissingArgument { .. });
    }

    #[test]
    fn callback_replaces_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let verbose = Arc::new(AtomicUsize::new(0));
        let counter = verbose.clone();
        let registry = scope()
            .add(Opt::flag("size").args("<width> <height>").kind(integer()).callback(
                move |arguments| {
                    let width = arguments.get("width").and_then(Value::as_integer);
                    let height = arguments.get("height").and_then(Value::as_integer);
                    sink.lock().unwrap().push((width, height));
                },
            ))
            .add(Opt::switch("verbose").short('v').callback(move |arguments| {
                assert_eq!(arguments.first(), Some(&Value::Bool(true)));
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .unwrap();
        let parsed = run(&registry, &["--size", "3", "4", "-v", "-v"]).unwrap();

        assert!(parsed.state.is_empty());
        assert_eq!(*seen.lock().unwrap(), vec![(Some(3), Some(4))]);
        assert_eq!(verbose.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn bool_negation_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let registry = scope()
            .add(Opt::boolean("cache").callback(move |arguments| {
                sink.lock().unwrap().push(arguments.get("cache").cloned());
            }))
            .build()
            .unwrap();
        run(&registry, &["--cache", "--no-cache"]).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some(Value::Bool(true)), Some(Value::Bool(false))]
        );
    }

    fn command_registry(grammar: &str) -> Registry {
        scope()
            .add(Opt::switch("verbose").short('v'))
            .command(
                Command::new("build")
                    .args(grammar)
                    .declare(|scope| scope.add(Opt::switch("release").short('r'))),
            )
            .command(Command::new("test"))
            .build()
            .unwrap()
    }

    #[test]
    fn command_scopes() {
        let registry = command_registry("[<target>]");
        let parsed = run(&registry, &["build", "-r", "app", "-v", "extra"]).unwrap();
        let build = parsed.state.command("build").unwrap();

        assert_eq!(build.get("release"), Some(&Value::Bool(true)));
        assert_eq!(build.get(ARGS_KEY), Some(&Value::List(vec![Value::from("app")])));
        assert_eq!(parsed.state.get("verbose"), Some(&Value::Bool(true)));
        assert_eq!(parsed.state.get("release"), None);
        assert_eq!(parsed.arguments, tokens(&["extra"]));
    }

    #[test]
    fn command_options_out_of_scope() {
        let registry = command_registry("[<target>]");
        let parsed = run(&registry, &["--release", "build"]).unwrap();

        assert_eq!(parsed.arguments, tokens(&["--release"]));
        assert!(parsed.state.command("build").is_some());
    }

    #[rstest]
    #[case("[<target>...]", vec![Value::from(vec!["arg", "test"])], vec![])]
    #[case("<target>", vec![Value::from("arg")], vec!["test"])]
    #[case("", vec![], vec!["arg", "test"])]
    fn single_command(
        #[case] grammar: &str,
        #[case] expected: Vec<Value>,
        #[case] arguments: Vec<&str>,
    ) {
        let registry = command_registry(grammar);
        let parsed = run(&registry, &["build", "arg", "test"]).unwrap();
        let build = parsed.state.command("build").unwrap();

        assert_eq!(build.get(ARGS_KEY), Some(&Value::List(expected)));
        assert!(parsed.state.command("test").is_none());
        assert_eq!(parsed.arguments, tokens(&arguments));
    }

    #[test]
    fn single_command_callbacks() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (first, second) = (runs.clone(), runs.clone());
        let registry = scope()
            .command(Command::new("a").callback(move |_| {
                first.fetch_add(1, Ordering::SeqCst);
            }))
            .command(Command::new("b").callback(move |_| {
                second.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .unwrap();
        let parsed = run(&registry, &["a", "b", "a"]).unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(parsed.arguments, tokens(&["b", "a"]));
        assert!(registry.find_command("a").unwrap().is_materialized());
        assert!(!registry.find_command("b").unwrap().is_materialized());
    }

    #[test]
    fn command_interior_optional() {
        let registry = scope()
            .command(Command::new("span").args("[<a>] <b> <c> [<d>]"))
            .build()
            .unwrap();

        let parsed = run(&registry, &["span", "1", "4"]).unwrap();
        assert_eq!(
            parsed.state.command("span").unwrap().get(ARGS_KEY),
            Some(&Value::List(vec![
                Value::Null,
                Value::from("1"),
                Value::from("4"),
                Value::Null,
            ]))
        );
    }

    fn parity(name: &str, even: bool) -> ArgumentSlot {
        ArgumentSlot::new(name)
            .kind(integer())
            .constraint(move |v| v.as_integer().map(|i| (i % 2 == 0) == even).unwrap_or(false))
    }

    // [<a>] <b> <c> [<d>], where 'a' and 'c' take even numbers, 'b' and 'd' take odd numbers.
    fn parity_slots() -> Vec<ArgumentSlot> {
        vec![
            parity("a", true).optional(true),
            parity("b", false),
            parity("c", true),
            parity("d", false).optional(true),
        ]
    }

    fn integers(values: &[Option<i64>]) -> Value {
        Value::List(
            values
                .iter()
                .map(|value| value.map(Value::Integer).unwrap_or(Value::Null))
                .collect(),
        )
    }

    #[rstest]
    #[case(vec!["1", "4"], vec![None, Some(1), Some(4), None], vec![])]
    #[case(vec!["1", "4", "3"], vec![None, Some(1), Some(4), Some(3)], vec![])]
    #[case(vec!["2", "1", "4"], vec![Some(2), Some(1), Some(4), None], vec![])]
    #[case(vec!["2", "1", "4", "3"], vec![Some(2), Some(1), Some(4), Some(3)], vec![])]
    #[case(vec!["2", "1", "4", "3", "5"], vec![Some(2), Some(1), Some(4), Some(3)], vec!["5"])]
    fn interior_optionals(
        #[case] input: Vec<&str>,
        #[case] expected: Vec<Option<i64>>,
        #[case] arguments: Vec<&str>,
    ) {
        let registry = scope()
            .add(Opt::flag("digits").slots(parity_slots()))
            .command(Command::new("span").slots(parity_slots()))
            .build()
            .unwrap();

        let mut flag_input = vec!["--digits"];
        flag_input.extend(input.iter());
        let parsed = run(&registry, &flag_input).unwrap();
        assert_eq!(parsed.state.get("digits"), Some(&integers(&expected)));
        assert_eq!(parsed.arguments, tokens(&arguments));

        let mut command_input = vec!["span"];
        command_input.extend(input.iter());
        let parsed = run(&registry, &command_input).unwrap();
        assert_eq!(
            parsed.state.command("span").unwrap().get(ARGS_KEY),
            Some(&integers(&expected))
        );
        assert_eq!(parsed.arguments, tokens(&arguments));
    }

    #[test]
    fn interior_optionals_spares() {
        // Collection keeps "2 1" as a possible prefix, but the spare budget leaves 'a' empty and 'b' rejects "2".
        let registry = scope()
            .add(Opt::flag("digits").slots(parity_slots()))
            .command(Command::new("span").slots(parity_slots()))
            .build()
            .unwrap();

        for (head, node) in [("--digits", "digits"), ("span", "span")] {
            let (offset, error) = run(&registry, &[head, "2", "1"]).unwrap_err();
            assert_eq!(offset, 2);
            assert_eq!(
                error,
                ParseError::MissingArgument {
                    node: node.to_string(),
                    supplied: tokens(&["2", "1"]),
                    expected: "[<a>] <b> <c> [<d>]".to_string(),
                }
            );
        }
    }

    #[test]
    fn command_missing_argument() {
        let registry = scope()
            .command(Command::new("copy").args("<source> <target>"))
            .build()
            .unwrap();
        let (_, error) = run(&registry, &["copy", "a"]).unwrap_err();

        assert_eq!(
            error,
            ParseError::MissingArgument {
                node: "copy".to_string(),
                supplied: vec!["a".to_string()],
                expected: "<source> <target>".to_string(),
            }
        );
    }

    #[test]
    fn command_callback_arguments() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let registry = scope()
            .command(
                Command::new("copy")
                    .args("<source> <target>")
                    .callback(move |arguments| {
                        sink.lock().unwrap().replace(arguments.clone());
                    })
                    .declare(|scope| scope.add(Opt::switch("force"))),
            )
            .build()
            .unwrap();
        let parsed = run(&registry, &["copy", "a", "--force", "b"]).unwrap();
        let arguments = seen.lock().unwrap().clone().unwrap();

        assert_eq!(arguments.get("source"), Some(&Value::from("a")));
        assert_eq!(arguments.get("target"), Some(&Value::from("b")));
        let copy = parsed.state.command("copy").unwrap();
        assert_eq!(copy.get("force"), Some(&Value::Bool(true)));
        assert!(!copy.contains(ARGS_KEY));
    }

    #[test]
    fn command_declaration_error() {
        let registry = scope()
            .command(Command::new("build").declare(|scope| {
                scope.add(Opt::flag("target").kind_named("colour"))
            }))
            .build()
            .unwrap();
        let (_, error) = run(&registry, &["build"]).unwrap_err();

        assert_eq!(
            error,
            ParseError::Declaration(crate::parser::ConfigError::UnknownType(
                "colour".to_string()
            ))
        );
    }

    #[test]
    fn initial_state() {
        let registry = command_registry("[<target>]");
        let mut state = State::default();
        state.insert("verbose", false);
        state.insert("extra", 1);
        let parsed = Matcher::new(&registry, false)
            .run(&tokens(&["-v"]), state)
            .unwrap();

        assert_eq!(parsed.state.get("verbose"), Some(&Value::Bool(true)));
        assert_eq!(parsed.state.get("extra"), Some(&Value::Integer(1)));
    }

    #[test]
    fn matcher_reusable() {
        let registry = command_registry("[<target>]");
        let matcher = Matcher::new(&registry, false);

        for _ in 0..3 {
            let parsed = matcher.run(&tokens(&["build", "x"]), State::default()).unwrap();
            assert!(parsed.state.command("build").is_some());
        }
    }
}
