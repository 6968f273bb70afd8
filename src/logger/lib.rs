pub enum Logger {
    DevNull,
    CommandLine(Verbosity),
}

impl Logger {
    pub fn log(&self, message: &str) {
        match self {
            Logger::DevNull => {}
            Logger::CommandLine(verbosity) => {
                if !matches!(verbosity, Verbosity::Quiet) {
                    println!("{}", message);
                }
            }
        }
    }

    pub fn log_debug(&self, message: &str) {
        match self {
            Logger::DevNull => {}
            Logger::CommandLine(verbosity) => {
                if matches!(verbosity, Verbosity::Debugging) {
                    println!("{}", message);
                }
            }
        }
    }

    pub fn get_verbosity(&self) -> Verbosity {
        match self {
            Logger::DevNull => Verbosity::Quiet,
            Logger::CommandLine(verbosity) => *verbosity,
        }
    }
}

#[derive(Copy, Clone)]
pub enum Verbosity {
    Quiet,
    Simple,
    Debugging,
}
