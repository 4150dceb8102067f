//! Template content for the generated entry point.

/// Template for `main.go`.
///
/// Context: `name`, `version` and `imports` (distinct service URLs, in first
/// occurrence order). Every value lands in a Go string literal through the
/// `goquote` filter.
pub const MAIN_GO_TEMPLATE: &str = r#"// Code generated by trellis. DO NOT EDIT.

package main

import (
	"fmt"
	"os"

	"github.com/go-trellis/trellis/cmd"
)
{% for url in imports %}
import _ {{ url|goquote }}
{%- endfor %}

func main() {
	if err := cmd.Run({{ name|goquote }}, {{ version|goquote }}); err != nil {
		fmt.Fprintln(os.Stderr, err)
		os.Exit(1)
	}
}
"#;
