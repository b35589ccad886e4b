/*!

This module is for managing errors in the code of meshvc-sim. To avoid invoking `panic!` in favor of a more graceful exit. Cases that should never happen can be kept as `panic!`.

Instead of `expect` or `unwrap_or_else` try
* `map_err` like in `.map_err(|e|Error::could_not_open_file(source_location!(),path.clone(),e))?;`
* `ok_or_else` like in `.ok_or_else( ||Error::scenario_invalid(source_location!(),"src and dest coincide".to_string()) )?;`

Instead of `panic!` try
* Return an error. E.g., by `return Err( Error::config_invalid(source_location!(),"dimension must be positive".to_string()) );`

The `error!` macro may ease up the writing a little. E.g., `error!(config_invalid,"dimension must be positive".to_string())`.

When displaying errors
* Write to the standard error instead of to the standard output. I.e., with `eprintln!` instead of `println!`.
* If you need to exit the application you may use `std::process::exit` instead of `panic!`.

*/

use std::fmt::{Display,Formatter};
use std::path::PathBuf;

/// The main Error class to be used in each `Result<Whatever,Error>`.
/// It contains the code source of the error and its kind.
/// An arbitrary `String` message can be optionally attached.
#[derive(Debug)]
pub struct Error
{
	pub source_location: SourceLocation,
	pub kind: ErrorKind,
	pub message: Option<String>,
}

/// A source code location where an error occurred.
/// Contains the values of the macros `std::{file,line,column}`.
#[derive(Debug)]
pub struct SourceLocation
{
	pub file: &'static str,
	pub line: u32,
	pub column: u32,
}

#[derive(Debug)]
pub enum ErrorKind
{
	/// The `noc`/`quantum` section of a config file could not be interpreted:
	/// quantum length mismatch, non-positive dimension, unknown arbitration or preemption policy.
	ConfigInvalid{
		reason: String,
	},
	/// A scenario file describes an impossible or nonsensical message:
	/// coordinates outside the mesh, src==dest, non-positive size/period/deadline, load outside (0,1].
	ScenarioInvalid{
		reason: String,
	},
	/// The configured cycle horizon elapsed while some message instances had not yet arrived.
	DeadlockSuspected{
		stuck_instances: usize,
	},
	/// A file could not be opened or read.
	CouldNotOpenFile{
		filepath: PathBuf,
		error: std::io::Error,
	},
	/// A YAML document could not be parsed into the expected structure.
	CouldNotParseFile{
		filepath: PathBuf,
		error: serde_yaml_ng::Error,
	},
	/// Some method received a bad argument. There should be an attached message with further explanation.
	BadArgument,
	/// Any other error. Better to add new types than to use this thing.
	Undetermined,
}

// source_location!()
#[macro_export]
macro_rules! source_location{
	() => {
		$crate::error::SourceLocation{
			file: file!(),
			line: line!(),
			column: column!(),
		}
	}
}
#[macro_export]
macro_rules! error{
	($kind:ident,$($args:tt)*) => {{
		$crate::error::Error::$kind( $crate::source_location!(), $($args)* )
	}};
	($kind:ident) => {{
		$crate::error::Error::$kind( $crate::source_location!() )
	}};
}

use ErrorKind::*;

impl Error
{
	pub fn new(source_location:SourceLocation, kind:ErrorKind) -> Error
	{
		Error{
			source_location,
			kind,
			message:None,
		}
	}
	pub fn with_message(mut self,message:String) -> Error
	{
		match self.message
		{
			Some(ref mut text) => *text += &message,
			None => self.message=Some(message),
		}
		self
	}
	pub fn config_invalid(source_location:SourceLocation,reason:String)->Error
	{
		Error{
			source_location,
			kind: ConfigInvalid{ reason },
			message:None,
		}
	}
	pub fn scenario_invalid(source_location:SourceLocation,reason:String)->Error
	{
		Error{
			source_location,
			kind: ScenarioInvalid{ reason },
			message:None,
		}
	}
	pub fn deadlock_suspected(source_location:SourceLocation,stuck_instances:usize)->Error
	{
		Error{
			source_location,
			kind: DeadlockSuspected{ stuck_instances },
			message:None,
		}
	}
	pub fn could_not_open_file(source_location:SourceLocation,filepath:PathBuf,error:std::io::Error)->Error
	{
		Error{
			source_location,
			kind: CouldNotOpenFile{ filepath, error },
			message:None,
		}
	}
	pub fn could_not_parse_file(source_location:SourceLocation,filepath:PathBuf,error:serde_yaml_ng::Error)->Error
	{
		Error{
			source_location,
			kind: CouldNotParseFile{ filepath, error },
			message:None,
		}
	}
	pub fn bad_argument(source_location:SourceLocation)->Error
	{
		Error{
			source_location,
			kind: BadArgument,
			message:None,
		}
	}
	pub fn undetermined(source_location:SourceLocation)->Error
	{
		Error{
			source_location,
			kind: Undetermined,
			message:None,
		}
	}
}


impl Display for Error
{
	fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), std::fmt::Error>
	{
		let Error{source_location:location,kind,message} = self;
		writeln!(formatter,"Error at file {} at line {} column {}.",location.file,location.line,location.column)?;
		if let Some(text) = message
		{
			writeln!(formatter,"{}",text)?;
		}
		kind.fmt(formatter)?;
		Ok(())
	}
}

impl Display for ErrorKind
{
	fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), std::fmt::Error>
	{
		match self
		{
			ConfigInvalid{reason} =>
			{
				writeln!(formatter,"ConfigInvalid error: {}",reason)?;
			},
			ScenarioInvalid{reason} =>
			{
				writeln!(formatter,"ScenarioInvalid error: {}",reason)?;
			},
			DeadlockSuspected{stuck_instances} =>
			{
				writeln!(formatter,"DeadlockSuspected warning: {} message instance(s) had not arrived when the cycle horizon elapsed.",stuck_instances)?;
			},
			CouldNotOpenFile{filepath,error} =>
			{
				writeln!(formatter,"CouldNotOpenFile error: The file {:?} could not be opened.\nio_error: {}",filepath,error)?;
			},
			CouldNotParseFile{filepath,error} =>
			{
				writeln!(formatter,"CouldNotParseFile error: The file {:?} could not be parsed.\nyaml_error: {}",filepath,error)?;
			},
			BadArgument =>
			{
				writeln!(formatter,"BadArgument: Bad arguments given to a function.")?;
			},
			Undetermined =>
			{
				writeln!(formatter,"Undetermined error: A generic error. The concrete error should be more specified.")?;
			},
		}
		Ok(())
	}
}

impl std::error::Error for Error {}
